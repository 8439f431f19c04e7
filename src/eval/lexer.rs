use logos::{Lexer, Logos};

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    #[token("(")]
    ParenStart,
    #[token(")")]
    ParenEnd,
    #[token("[")]
    BracketStart,
    #[token("]")]
    BracketEnd,
    #[token("{")]
    BraceStart,
    #[token("}")]
    BraceEnd,

    #[regex(r"[-+]?[0-9]+(\.[0-9]+)?", slice)]
    Number(&'a str),

    #[regex(r":[a-zA-Z0-9_.+=*/$@!?-]*", slice)]
    Atom(&'a str),

    #[token("nil")]
    Nil,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // a lone sign is a symbol, not a number
    #[token("+", slice)]
    #[token("-", slice)]
    #[regex(r"[a-zA-Z_*/$@!?&][a-zA-Z0-9_.+=*/$@!?&-]*", slice)]
    Symbol(&'a str),

    #[regex(r#""([^"\\]|\\.)*""#, slice)]
    Str(&'a str),

    #[error]
    #[regex(r"[ \t\r\n,]+", logos::skip)] // whitespace (comma included)
    Error,
}

fn slice<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    lex.slice()
}

//! Reader converts a string into [`Value`]s.

use std::collections::BTreeMap;

use logos::Logos;
use thiserror::Error;
use tracing::trace;

use crate::eval::lexer::Token;
use crate::eval::value::Value;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{msg}")]
pub struct ParseError {
    pub msg: String,
}

impl ParseError {
    fn new(msg: impl Into<String>) -> Self {
        ParseError { msg: msg.into() }
    }
}

/// Parses every form in `source`. The bracket pre-check guarantees that the
/// recursive read below never runs past a delimiter.
pub fn read(source: &str) -> Result<Vec<Value>, ParseError> {
    let tokens: Vec<Token<'_>> = Token::lexer(source).collect();
    trace!("lexed {} tokens", tokens.len());

    check_brackets(&tokens)?;

    let mut cursor = Cursor { tokens, pos: 0 };
    let mut res = Vec::new();
    while cursor.peek().is_some() {
        res.push(read_value(&mut cursor)?);
    }
    Ok(res)
}

fn check_brackets(tokens: &[Token<'_>]) -> Result<(), ParseError> {
    let mut expected: Vec<Token<'_>> = Vec::new();
    for token in tokens {
        match token {
            Token::Error => return Err(ParseError::new("Invalid token")),
            Token::ParenStart => expected.push(Token::ParenEnd),
            Token::BracketStart => expected.push(Token::BracketEnd),
            Token::BraceStart => expected.push(Token::BraceEnd),
            Token::ParenEnd | Token::BracketEnd | Token::BraceEnd => {
                if expected.pop().as_ref() != Some(token) {
                    return Err(ParseError::new(format!("Unexpected token {:?}", token)));
                }
            }
            _ => {}
        }
    }
    if !expected.is_empty() {
        return Err(ParseError::new("Unexpected end of input"));
    }
    Ok(())
}

struct Cursor<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

fn read_value(cursor: &mut Cursor<'_>) -> Result<Value, ParseError> {
    let token = cursor
        .next()
        .ok_or_else(|| ParseError::new("Unexpected end of input"))?;
    Ok(match token {
        Token::ParenStart => {
            let mut items = Vec::new();
            while !matches!(cursor.peek(), Some(Token::ParenEnd)) {
                items.push(read_value(cursor)?);
            }
            cursor.next();
            Value::List(items)
        }
        Token::BracketStart => {
            let mut items = Vec::new();
            while !matches!(cursor.peek(), Some(Token::BracketEnd)) {
                items.push(read_value(cursor)?);
            }
            cursor.next();
            Value::Vector(items)
        }
        Token::BraceStart => {
            let mut map = BTreeMap::new();
            while !matches!(cursor.peek(), Some(Token::BraceEnd)) {
                let key = read_value(cursor)?;
                if matches!(cursor.peek(), Some(Token::BraceEnd)) {
                    return Err(ParseError::new("Missing value in map"));
                }
                let value = read_value(cursor)?;
                map.insert(key, value);
            }
            cursor.next();
            Value::Map(map)
        }
        Token::Number(text) => Value::Number(
            text.parse()
                .map_err(|_| ParseError::new(format!("Invalid number {}", text)))?,
        ),
        Token::Atom(text) => Value::Atom(text[1..].to_string()),
        Token::Symbol(text) => symbol_value(text),
        Token::Str(text) => Value::Str(unescape(&text[1..text.len() - 1])),
        Token::Nil => Value::Nil,
        Token::True => Value::Bool(true),
        Token::False => Value::Bool(false),
        token @ (Token::ParenEnd | Token::BracketEnd | Token::BraceEnd | Token::Error) => {
            return Err(ParseError::new(format!("Unexpected token {:?}", token)));
        }
    })
}

/// A symbol's last `.` splits it into a namespace and a token.
fn symbol_value(text: &str) -> Value {
    match text.rfind('.') {
        Some(pos) => Value::Symbol {
            ns: Some(text[..pos].to_string()),
            token: text[pos + 1..].to_string(),
        },
        None => Value::Symbol {
            ns: None,
            token: text.to_string(),
        },
    }
}

/// `\t` becomes a tab, `\n` (optionally preceded by `\r`) a newline, and any
/// other escaped character stands for itself.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => {
                let rest = chars.as_str();
                if let Some(stripped) = rest.strip_prefix("\\n") {
                    chars = stripped.chars();
                    out.push('\n');
                } else {
                    out.push('r');
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

use mmlgen::mml::{parse, Document, Element, MmlError, TagKind};

fn parse_ok(source: &str) -> Document<'_> {
    match parse(source) {
        Ok(doc) => doc,
        Err(err) => panic!("parse failed with {:?} for input: {}", err, source),
    }
}

fn content_text<'a>(doc_element: &Element<'a>) -> &'a str {
    doc_element
        .as_content()
        .unwrap_or_else(|| panic!("expected content, got {:?}", doc_element))
        .text
}

#[test]
fn empty() {
    let doc = parse_ok("");
    assert_eq!(doc.elements.len(), 0);
    assert_eq!(doc.source, "");
}

#[test]
fn content_only() {
    let source = "\nHello World! This\nis some test input that is\n\nonly content";
    let doc = parse_ok(source);
    assert_eq!(doc.elements.len(), 1);
    assert_eq!(content_text(&doc.elements[0]), source);
}

#[test]
fn basic_tag() {
    let doc = parse_ok("~tag~");
    assert_eq!(doc.elements.len(), 1);
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.orig_text, "~tag~");
    assert_eq!(tag.name, "tag");
    assert_eq!(tag.kind, TagKind::Eol);
    assert!(tag.props.is_empty());
    assert!(tag.content.is_none());
}

#[test]
fn basic_props() {
    let doc = parse_ok("~tag[l=test;y=check]~");
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.name, "tag");
    assert_eq!(tag.props.len(), 2);
    assert_eq!(tag.props["l"], vec!["test"]);
    assert_eq!(tag.props["y"], vec!["check"]);
}

#[test]
fn repeat_props_accumulate_in_source_order() {
    let doc = parse_ok("~tag[l=test;y=check;y=double;l=another;y=check]~");
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.props.len(), 2);
    assert_eq!(tag.props["l"], vec!["test", "another"]);
    assert_eq!(tag.props["y"], vec!["check", "double", "check"]);
}

#[test]
fn quoted_props_hide_semicolons() {
    let doc = parse_ok(r#"~tag[l=test;y="check;the;semi;colons";x=five]~"#);
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.props.len(), 3);
    assert_eq!(tag.props["l"], vec!["test"]);
    assert_eq!(tag.props["y"], vec!["check;the;semi;colons"]);
    assert_eq!(tag.props["x"], vec!["five"]);
}

#[test]
fn quoted_props_hide_brackets() {
    let doc = parse_ok(r#"~tag[l=test;y="check[and brackets]";x=five]~"#);
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.props["y"], vec!["check[and brackets]"]);
}

#[test]
fn quoted_props_hide_semicolons_and_brackets() {
    let doc = parse_ok(r#"~tag[l=test;y="check;the;semi;colons[and brackets]";x=five]~"#);
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.props["y"], vec!["check;the;semi;colons[and brackets]"]);
}

#[test]
fn eol_tag_with_quoted_prop() {
    let doc = parse_ok(r#"~sec[l=2;label="A;B"]~"#);
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.kind, TagKind::Eol);
    assert_eq!(tag.name, "sec");
    assert_eq!(tag.props["l"], vec!["2"]);
    assert_eq!(tag.props["label"], vec!["A;B"]);
}

#[test]
fn brace_content() {
    let doc = parse_ok("~tag{my content}");
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.kind, TagKind::Brace);
    assert_eq!(tag.raw_content, Some("my content"));
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), "my content");
}

#[test]
fn brace_escaped() {
    let doc = parse_ok(r"~tag{my content\} but Escaped!}");
    let tag = doc.elements[0].as_tag().unwrap();
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), r"my content\} but Escaped!");
}

#[test]
fn brace_nested() {
    let doc = parse_ok("~tag{my content ~abc{test} but Nested!}");
    let tag = doc.elements[0].as_tag().unwrap();
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), "my content ");
    assert_eq!(children[1].as_tag().unwrap().orig_text, "~abc{test}");
    assert_eq!(content_text(&children[2]), " but Nested!");
}

#[test]
fn brace_escaped_nested() {
    let doc = parse_ok(r"~tag{my content \~abc{test} but Escaped!}");
    let tag = doc.elements[0].as_tag().unwrap();
    let children = tag.content.as_ref().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(content_text(&children[0]), r"my content \~abc{test} but Escaped!");
}

#[test]
fn block_default_end_tag() {
    let doc = parse_ok("~tag\nTest content\nInside\n~tag~");
    assert_eq!(doc.elements.len(), 1);
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.kind, TagKind::Block);
    assert_eq!(tag.name, "tag");
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), "Test content\nInside");
    assert_eq!(tag.raw_content, Some("Test content\nInside\n"));
}

#[test]
fn block_end_tag_with_trailing_text_does_not_terminate() {
    let source = "~tag\nTest content\nInside\n~tag~ test\n~tag~\ntest";
    let doc = parse_ok(source);
    assert_eq!(doc.elements.len(), 2);
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.orig_text, "~tag\nTest content\nInside\n~tag~ test\n~tag~");
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), "Test content\nInside");
    // the non-terminating `~tag~` parses as a nested EOL tag
    let nested = children[1].as_tag().unwrap();
    assert_eq!(nested.kind, TagKind::Eol);
    assert_eq!(content_text(&children[2]), " test");
    assert_eq!(tag.raw_content, Some("Test content\nInside\n~tag~ test\n"));
    assert_eq!(content_text(&doc.elements[1]), "\ntest");
}

#[test]
fn block_custom_delimiter() {
    let doc = parse_ok("~tag[delim=CHERRY]\nTest content\nInside\n~CHERRY~");
    assert_eq!(doc.elements.len(), 1);
    let tag = doc.elements[0].as_tag().unwrap();
    assert_eq!(tag.kind, TagKind::Block);
    assert_eq!(tag.props["delim"], vec!["CHERRY"]);
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), "Test content\nInside");
    assert_eq!(tag.raw_content, Some("Test content\nInside\n"));
}

#[test]
fn block_with_nested_brace_tag() {
    let doc = parse_ok("~tag[delim=CHERRY]\nTest content ~eval{hello}\nInside\n~CHERRY~");
    let tag = doc.elements[0].as_tag().unwrap();
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), "Test content ");
    let eval_tag = children[1].as_tag().unwrap();
    assert_eq!(eval_tag.name, "eval");
    assert_eq!(
        content_text(&eval_tag.content.as_ref().unwrap()[0]),
        "hello"
    );
    assert_eq!(content_text(&children[2]), "\nInside");
    assert_eq!(
        tag.raw_content,
        Some("Test content ~eval{hello}\nInside\n")
    );
}

#[test]
fn block_with_nested_block_tag() {
    let doc = parse_ok("~tag[delim=CHERRY]\nTest content\n  ~eval\n    hello\n  ~eval~\nInside\n~CHERRY~");
    let tag = doc.elements[0].as_tag().unwrap();
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), "Test content\n ");
    let eval_tag = children[1].as_tag().unwrap();
    assert_eq!(eval_tag.name, "eval");
    assert_eq!(eval_tag.kind, TagKind::Block);
    assert_eq!(
        content_text(&eval_tag.content.as_ref().unwrap()[0]),
        "    hello\n "
    );
    assert_eq!(content_text(&children[2]), "\nInside");
    assert_eq!(
        tag.raw_content,
        Some("Test content\n  ~eval\n    hello\n  ~eval~\nInside\n")
    );
}

#[test]
fn block_with_nested_same_name_block() {
    let doc = parse_ok("~tag\nTest content\n~tag\nhello\n~tag~\nInside\n~tag~");
    assert_eq!(doc.elements.len(), 1);
    let tag = doc.elements[0].as_tag().unwrap();
    let children = tag.content.as_ref().unwrap();
    assert_eq!(content_text(&children[0]), "Test content");
    let nested = children[1].as_tag().unwrap();
    assert_eq!(nested.name, "tag");
    assert_eq!(content_text(&nested.content.as_ref().unwrap()[0]), "hello");
    assert_eq!(content_text(&children[2]), "\nInside");
    assert_eq!(
        tag.raw_content,
        Some("Test content\n~tag\nhello\n~tag~\nInside\n")
    );
}

#[test]
fn invalid_inline_block_tag_in_body() {
    let res = parse("~tag[delim=CHERRY]\nTest content ~eval hello\nInside\n          ~CHERRY~");
    assert_eq!(res.unwrap_err(), MmlError::UnexpectedCharacter);
}

#[test]
fn invalid_unterminated_tag_at_eof() {
    let res = parse("~tag my content}");
    assert_eq!(res.unwrap_err(), MmlError::UnexpectedCharacter);
}

#[test]
fn invalid_unterminated_tag_no_nested() {
    let res = parse("~tag my content ~tag~}");
    assert_eq!(res.unwrap_err(), MmlError::UnexpectedCharacter);
}

#[test]
fn invalid_unterminated_block() {
    let res = parse("~tag my content}\n        )");
    assert_eq!(res.unwrap_err(), MmlError::UnexpectedCharacter);
}

#[test]
fn invalid_unterminated_block_with_eol_tag() {
    let res = parse("~tag my content ~tag~}\n        )");
    assert_eq!(res.unwrap_err(), MmlError::UnexpectedCharacter);
}

#[test]
fn invalid_missing_tag_name() {
    assert!(parse("~{content}").is_err());
    assert!(parse("~1tag~").is_err());
}

#[test]
fn block_tags_must_start_on_their_own_line() {
    // mid-line block start is rejected at the top level
    assert!(parse("text ~b\nbody\n~b~").is_err());
    // after a newline it is fine
    let doc = parse_ok("text\n~b\nbody\n~b~");
    assert_eq!(doc.elements.len(), 2);
    assert_eq!(doc.elements[1].as_tag().unwrap().kind, TagKind::Block);
}

#[test]
fn parse_is_lossless() {
    let sources = [
        "plain text only",
        "~tag[l=2]~ and some text ~b{inner ~c{deep}} end",
        "prefix\n~tag[delim=X]\nbody ~inline{v}\n~X~\nsuffix",
        "escaped \\~not-a-tag still content",
    ];
    for source in sources {
        let doc = parse_ok(source);
        let rebuilt: String = doc.elements.iter().map(|e| e.orig_text()).collect();
        assert_eq!(rebuilt, source);
    }
}

#[test]
fn brace_children_tile_raw_content() {
    let doc = parse_ok("~tag{my content ~abc{test} but Nested!}");
    let tag = doc.elements[0].as_tag().unwrap();
    let tiled: String = tag
        .content
        .as_ref()
        .unwrap()
        .iter()
        .map(|e| e.orig_text())
        .collect();
    assert_eq!(tiled, tag.raw_content.unwrap());
}

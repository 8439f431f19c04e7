//! MML document tree. Every `&'a str` in here is a subslice of the source
//! text the document was parsed from.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MmlError {
    #[error("null input")]
    NullInput,
    #[error("unexpected character")]
    UnexpectedCharacter,
}

/// A contiguous run of source text containing no tag start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Self-closed: `~name~` or `~name[props]~`.
    Eol,
    /// Inline content: `~name{...}`.
    Brace,
    /// Multi-line body terminated by a line-leading `~DELIM~`.
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag<'a> {
    pub kind: TagKind,
    /// The exact source slice of the whole tag.
    pub orig_text: &'a str,
    pub name: &'a str,
    /// Property values accumulate in source order; keys may repeat.
    pub props: BTreeMap<String, Vec<&'a str>>,
    pub content: Option<Vec<Element<'a>>>,
    /// The exact content slice (brace interior or block body).
    pub raw_content: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element<'a> {
    Content(Content<'a>),
    Tag(Tag<'a>),
}

impl<'a> Element<'a> {
    pub fn as_content(&self) -> Option<&Content<'a>> {
        if let Element::Content(content) = self {
            Some(content)
        } else {
            None
        }
    }

    pub fn as_tag(&self) -> Option<&Tag<'a>> {
        if let Element::Tag(tag) = self {
            Some(tag)
        } else {
            None
        }
    }

    /// The exact source slice of this element.
    pub fn orig_text(&self) -> &'a str {
        match self {
            Element::Content(content) => content.text,
            Element::Tag(tag) => tag.orig_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    pub source: &'a str,
    pub elements: Vec<Element<'a>>,
}

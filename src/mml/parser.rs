//! Parser converts source text into a [`Document`].
//!
//! The parse is lossless: concatenating the `orig_text` of the top-level
//! elements reproduces the source byte-for-byte.

use std::collections::BTreeMap;

use tracing::trace;

use crate::mml::tree::{Content, Document, Element, MmlError, Tag, TagKind};
use crate::str_utils::{
    ends_with_newline_ws, find_after_newline_ws, find_not_escaped, find_not_escaped_stack,
    find_not_quoted, starts_with_trails_newline_ws,
};

/// Which tag forms may start at the current position. Block tags must begin
/// on their own line, so positions in the middle of a line only admit the
/// EOL and brace forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllowedTags {
    All,
    BraceOnly,
}

pub fn parse(source: &str) -> Result<Document<'_>, MmlError> {
    trace!("parse: {} bytes", source.len());
    let parser = Parser {
        src: source,
        bytes: source.as_bytes(),
    };

    let end = source.len();
    let mut iter = 0;
    let mut allowed = AllowedTags::All;
    let mut elements = Vec::new();
    while let Some(element) = parser.parse_element(&mut iter, end, allowed) {
        allowed = match &element {
            Element::Content(content) => {
                if ends_with_newline_ws(content.text) {
                    AllowedTags::All
                } else {
                    AllowedTags::BraceOnly
                }
            }
            Element::Tag(tag) => {
                if ends_with_newline_ws(tag.orig_text) || tag.kind == TagKind::Block {
                    AllowedTags::All
                } else {
                    AllowedTags::BraceOnly
                }
            }
        };
        elements.push(element);
    }

    if iter != end {
        return Err(MmlError::UnexpectedCharacter);
    }

    Ok(Document { source, elements })
}

fn is_tag_name_char(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_prop_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
}

impl<'a> Parser<'a> {
    fn parse_element(
        &self,
        iter: &mut usize,
        end: usize,
        allowed: AllowedTags,
    ) -> Option<Element<'a>> {
        if let Some(content) = self.parse_content(iter, end) {
            return Some(content);
        }
        self.parse_tag(iter, end, allowed)
    }

    /// Parses a whole `[start, end)` range; fails unless the elements tile
    /// the range exactly.
    fn parse_elements(
        &self,
        iter: &mut usize,
        end: usize,
        allowed: AllowedTags,
    ) -> Option<Vec<Element<'a>>> {
        let mut res = Vec::new();
        while let Some(element) = self.parse_element(iter, end, allowed) {
            res.push(element);
        }
        if *iter != end {
            return None;
        }
        Some(res)
    }

    fn parse_content(&self, iter: &mut usize, end: usize) -> Option<Element<'a>> {
        if *iter >= end {
            return None;
        }
        let start = *iter;
        let content_end = find_not_escaped(self.src, start, end, b'~', b'\\');
        if content_end == start {
            return None;
        }
        *iter = content_end;
        Some(Element::Content(Content {
            text: &self.src[start..content_end],
        }))
    }

    /// End of the tag name starting at `start`, or `None` when there is no
    /// name or the name runs to the end of input.
    fn grab_tag_name(&self, start: usize, end: usize) -> Option<usize> {
        let mut name_end = start;
        while name_end < end && is_tag_name_char(self.bytes[name_end]) {
            name_end += 1;
        }
        if name_end == start || name_end == end {
            return None;
        }
        Some(name_end)
    }

    fn parse_props(&self, start: usize, end: usize) -> Option<BTreeMap<String, Vec<&'a str>>> {
        let mut res: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
        let mut iter = start;
        while iter != end {
            let mut name_end = iter;
            while name_end < end && is_prop_name_char(self.bytes[name_end]) {
                name_end += 1;
            }
            if name_end == iter || name_end == end || self.bytes[name_end] != b'=' {
                return None;
            }
            let name = &self.src[iter..name_end];

            let value_start = name_end + 1;
            if value_start == end {
                return None;
            }
            let value;
            let mut value_end;
            if self.bytes[value_start] == b'"' {
                value_end = find_not_escaped(self.src, value_start + 1, end, b'"', b'\\');
                if value_end == end {
                    return None;
                }
                value = &self.src[value_start + 1..value_end];
                // the closing quote must be followed by `;` or the prop end
                if value_end + 1 != end {
                    if self.bytes[value_end + 1] != b';' {
                        return None;
                    }
                    value_end += 1;
                }
            } else {
                value_end = find_not_escaped(self.src, value_start, end, b';', b'\\');
                if value_end == value_start {
                    return None;
                }
                value = &self.src[value_start..value_end];
            }

            iter = if value_end == end { value_end } else { value_end + 1 };
            res.entry(name.to_string()).or_default().push(value);
        }
        Some(res)
    }

    fn parse_tag(&self, iter: &mut usize, end: usize, allowed: AllowedTags) -> Option<Element<'a>> {
        if *iter >= end || self.bytes[*iter] != b'~' {
            return None;
        }

        let start = *iter;
        let name_start = start + 1;
        let name_end = self.grab_tag_name(name_start, end)?;
        let name = &self.src[name_start..name_end];

        let mut props = BTreeMap::new();
        let mut seg = name_end;

        if self.bytes[seg] == b'~' {
            *iter = seg + 1;
            trace!("eol tag: {}", name);
            return Some(Element::Tag(Tag {
                kind: TagKind::Eol,
                orig_text: &self.src[start..*iter],
                name,
                props,
                content: None,
                raw_content: None,
            }));
        }

        if self.bytes[seg] == b'[' {
            let prop_start = seg + 1;
            let prop_end = find_not_quoted(self.src, seg, end, b']');
            if prop_end == end {
                return None;
            }
            props = self.parse_props(prop_start, prop_end)?;
            seg = prop_end + 1;
            if seg >= end {
                return None;
            }
        }

        if self.bytes[seg] == b'~' {
            *iter = seg + 1;
            trace!("eol tag: {}", name);
            return Some(Element::Tag(Tag {
                kind: TagKind::Eol,
                orig_text: &self.src[start..*iter],
                name,
                props,
                content: None,
                raw_content: None,
            }));
        }

        if self.bytes[seg] == b'{' {
            let content_start = seg + 1;
            let content_end = find_not_escaped_stack(self.src, seg, end, b'}', b'{');
            if content_end == end {
                return None;
            }
            *iter = content_end + 1;
            trace!("brace tag: {}", name);
            let mut inner = content_start;
            // an interior that fails to parse leaves `content` unset; the
            // raw slice is still available to consumers
            let content = self.parse_elements(&mut inner, content_end, AllowedTags::BraceOnly);
            return Some(Element::Tag(Tag {
                kind: TagKind::Brace,
                orig_text: &self.src[start..*iter],
                name,
                props,
                content,
                raw_content: Some(&self.src[content_start..content_end]),
            }));
        }

        if allowed != AllowedTags::All {
            return None;
        }

        // block tag: the body starts on the next line
        let mut nl = seg;
        while nl < end && self.bytes[nl] != b'\n' {
            nl += 1;
        }
        if nl == end || nl + 1 == end {
            return None;
        }
        let content_start = nl + 1;

        let delim = props
            .get("delim")
            .and_then(|values| values.first())
            .copied()
            .unwrap_or(name);
        let terminator = format!("~{}~", delim);
        trace!("block tag: {} (delim {})", name, delim);

        let mut content: Vec<Element<'a>> = Vec::new();
        let mut last = content_start;
        let mut next_tag = find_after_newline_ws(self.src, content_start, end, b'~');
        while next_tag != end {
            // the segment before a line-leading tag excludes the byte right
            // in front of it (the newline, or the last whitespace byte)
            if next_tag > last {
                let mut seg_iter = last;
                let elements = self.parse_elements(&mut seg_iter, next_tag - 1, AllowedTags::All)?;
                content.extend(elements);
            }

            if starts_with_trails_newline_ws(self.src, next_tag, end, &terminator) {
                *iter = next_tag + terminator.len();
                return Some(Element::Tag(Tag {
                    kind: TagKind::Block,
                    orig_text: &self.src[start..*iter],
                    name,
                    props,
                    content: Some(content),
                    raw_content: Some(&self.src[content_start..next_tag]),
                }));
            }

            let mut tag_end = next_tag;
            let tag = self.parse_tag(&mut tag_end, end, AllowedTags::All)?;
            if tag_end == end {
                // the enclosing block is unterminated
                return None;
            }
            content.push(tag);
            last = tag_end;
            next_tag = find_after_newline_ws(self.src, tag_end, end, b'~');
        }
        None
    }
}

// The markup pipeline:
// 1. tree types (views into the source text):
pub mod tree;
// 2. string -> document
pub mod parser;

pub use parser::parse;
pub use tree::{Content, Document, Element, MmlError, Tag, TagKind};

// The expression pipeline:
// 1. token definitions:
pub mod lexer;
// 2. tokens -> values
pub mod reader;
pub mod value;
// 3. evaluation: lexical frames + the namespaced context
pub mod context;
pub mod frame;

pub use context::Context;
pub use frame::Frame;
pub use value::{EvalPolicy, Value};

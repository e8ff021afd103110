//! Filter parser.
//!
//! A hand-written recursive descent parser with binding-power handling for
//! the `and`/`or` connectives.

mod error;
mod parser;

pub use error::ParseError;
pub use parser::{Parser, parse_filter};

//! Filter expression lexer.
//!
//! Turns a `$filter` string into a stream of tokens: identifiers, the
//! OData keyword operators (`eq`, `and`, ...), literals and parentheses.

mod token;
mod tokenizer;

pub use token::{Keyword, Span, Token, TokenKind};
pub use tokenizer::Lexer;

//! Error types for query compilation.

use thiserror::Error;

use crate::parser::ParseError;

/// Errors raised while compiling a query. Compilation stops at the first
/// offending directive; no partial SQL is ever returned.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The query input is not a string, a key/value map or a request with a URL.
    #[error("unsupported query input: {0}")]
    UnsupportedInput(String),

    /// The request URL could not be parsed.
    #[error("invalid request url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Malformed `$filter` expression.
    #[error("invalid $filter: {0}")]
    FilterSyntax(#[from] ParseError),

    /// Malformed `$apply` expression.
    #[error("invalid $apply: {0}")]
    InvalidApply(String),

    /// `$top` or `$skip` is not a non-negative integer.
    #[error("invalid {directive} value: '{value}'")]
    InvalidPaging {
        directive: &'static str,
        value: String,
    },

    /// Malformed `$orderby` entry.
    #[error("invalid $orderby entry: '{0}'")]
    InvalidOrderBy(String),

    /// A column, alias or table name that is not a plain SQL identifier.
    #[error("invalid identifier in {directive}: '{name}'")]
    InvalidIdentifier {
        directive: &'static str,
        name: String,
    },

    /// Malformed `$expand` expression.
    #[error("invalid $expand: {0}")]
    InvalidExpand(String),

    /// `$expand` names a table the primary table declares no join to.
    #[error("no relation from '{table}' to '{relation}' is declared in the schema")]
    UnknownRelation { table: String, relation: String },
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

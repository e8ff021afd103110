//! Schema-aware column resolution.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CompileError, Result};
use crate::join::JoinPlanner;
use crate::schema::Schema;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("identifier pattern is valid")
});

/// Returns true if `name` is a plain or dot-qualified SQL identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Checks that `name` is an identifier, naming `directive` in the error.
///
/// # Errors
///
/// Returns `CompileError::InvalidIdentifier` otherwise.
pub fn check_identifier(name: &str, directive: &'static str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier {
            directive,
            name: String::from(name),
        })
    }
}

/// Returns the qualifier of a resolved reference (`u` for `u.name`).
#[must_use]
pub fn qualifier_of(reference: &str) -> Option<&str> {
    reference.rsplit_once('.').map(|(q, _)| q)
}

/// Qualifies bare column names with the alias of the table that owns them.
///
/// Tables are scanned in schema declaration order and the first table that
/// declares the column wins, so a column name shared by two tables always
/// resolves to the earlier one. A table joined from the primary table is
/// qualified with the alias its join declares, so resolved columns always
/// name the alias the `JOIN` clause introduces. Names that are already
/// qualified are returned unchanged. Unknown names get the primary table's alias, or stay
/// bare when the primary table has none.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    schema: &'a Schema,
    table: &'a str,
    alias: Option<&'a str>,
    planner: JoinPlanner<'a>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver for queries against `table`, referenced as `alias`.
    #[must_use]
    pub const fn new(schema: &'a Schema, table: &'a str, alias: Option<&'a str>) -> Self {
        Self {
            schema,
            table,
            alias,
            planner: JoinPlanner::new(schema, table),
        }
    }

    /// Returns the prefix applied to columns no table declares (`"u."` or `""`).
    #[must_use]
    pub fn default_prefix(&self) -> String {
        self.alias.map(|a| format!("{a}.")).unwrap_or_default()
    }

    /// Resolves a single field reference.
    #[must_use]
    pub fn resolve(&self, field: &str) -> String {
        if field.contains('.') {
            return String::from(field);
        }

        for (name, table) in self.schema.tables() {
            if table.has_column(field) {
                let qualifier = if name == self.table {
                    self.alias.unwrap_or(name)
                } else {
                    self.planner
                        .join_alias(name)
                        .unwrap_or_else(|| self.schema.qualifier(name))
                };
                return format!("{qualifier}.{field}");
            }
        }

        format!("{}{field}", self.default_prefix())
    }
}

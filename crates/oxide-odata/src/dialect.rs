//! Placeholder dialects.
//!
//! Databases disagree on how positional parameters are spelled. MySQL and
//! SQLite use `?`, PostgreSQL numbers them `$1, $2, ...`. Placeholders are
//! written by [`SqlWriter`] at the moment a parameter is bound, so the
//! numbering always follows the order of the parameter list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::SqlValue;

/// Trait for dialect-specific placeholder syntax.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the placeholder for the parameter at `position` (1-based).
    fn placeholder(&self, position: usize) -> String;
}

/// `?` placeholders (MySQL, SQLite).
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn placeholder(&self, _position: usize) -> String {
        String::from("?")
    }
}

/// `$n` placeholders (PostgreSQL).
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }
}

/// Placeholder style selected in [`CompileOptions`](crate::CompileOptions).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?`
    #[default]
    Mysql,
    /// `$1, $2, ...`
    Postgres,
}

impl PlaceholderStyle {
    /// Returns the dialect implementing this style.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Mysql => &MySqlDialect,
            Self::Postgres => &PostgresDialect,
        }
    }
}

impl FromStr for PlaceholderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown placeholder style: {other}")),
        }
    }
}

impl fmt::Display for PlaceholderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dialect().name())
    }
}

/// Accumulates SQL text together with its bound parameters.
pub struct SqlWriter<'d> {
    dialect: &'d dyn Dialect,
    sql: String,
    params: Vec<SqlValue>,
}

impl<'d> SqlWriter<'d> {
    /// Creates an empty writer for the given dialect.
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Appends raw SQL text.
    pub fn push_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Binds `value` and appends its placeholder.
    pub fn push_param(&mut self, value: SqlValue) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    /// Consumes the writer, returning the SQL and its parameters.
    #[must_use]
    pub fn finish(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

//! Declarative table and relationship schema.
//!
//! The schema is read-only input to the compiler. It is usually loaded from
//! JSON:
//!
//! ```json
//! {
//!   "users": {
//!     "alias": "u",
//!     "columns": ["id", "name", "email", "role_id"],
//!     "joins": {
//!       "roles": { "type": "LEFT", "on": "u.role_id = r.id", "alias": "r" }
//!     }
//!   },
//!   "roles": { "alias": "r", "columns": ["id", "label"] }
//! }
//! ```
//!
//! Declaration order matters: column resolution scans tables in the order
//! they are declared and the first table owning a column wins.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Join types a schema may declare.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JoinType {
    /// LEFT JOIN
    #[default]
    Left,
    /// INNER JOIN
    Inner,
    /// RIGHT JOIN
    Right,
    /// FULL JOIN
    Full,
    /// CROSS JOIN
    Cross,
}

impl JoinType {
    /// Returns the SQL keyword preceding `JOIN`.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Inner => "INNER",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Cross => "CROSS",
        }
    }
}

impl FromStr for JoinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LEFT" | "LEFT OUTER" => Ok(Self::Left),
            "INNER" => Ok(Self::Inner),
            "RIGHT" | "RIGHT OUTER" => Ok(Self::Right),
            "FULL" | "FULL OUTER" => Ok(Self::Full),
            "CROSS" => Ok(Self::Cross),
            other => Err(format!("unknown join type: {other}")),
        }
    }
}

impl TryFrom<String> for JoinType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JoinType> for String {
    fn from(value: JoinType) -> Self {
        String::from(value.as_sql())
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A join declared from one table to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Join type, `LEFT` when omitted.
    #[serde(rename = "type", default)]
    pub kind: JoinType,
    /// Raw SQL join predicate. Supplied by the schema author, not validated.
    pub on: String,
    /// Alias of the joined table. Falls back to the joined table's own alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl JoinSpec {
    /// Creates a join of the given type.
    #[must_use]
    pub fn new(kind: JoinType, on: impl Into<String>) -> Self {
        Self {
            kind,
            on: on.into(),
            alias: None,
        }
    }

    /// Creates a LEFT join.
    #[must_use]
    pub fn left(on: impl Into<String>) -> Self {
        Self::new(JoinType::Left, on)
    }

    /// Creates an INNER join.
    #[must_use]
    pub fn inner(on: impl Into<String>) -> Self {
        Self::new(JoinType::Inner, on)
    }

    /// Sets the alias of the joined table.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// One table of the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table alias used to qualify its columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Declared columns, unique within the table.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Joins to other tables, keyed by joined table name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub joins: IndexMap<String, JoinSpec>,
}

impl TableSchema {
    /// Creates a table with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alias: None,
            columns: columns.into_iter().map(Into::into).collect(),
            joins: IndexMap::new(),
        }
    }

    /// Sets the table alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Declares a join to `table`.
    #[must_use]
    pub fn join(mut self, table: impl Into<String>, spec: JoinSpec) -> Self {
        self.joins.insert(table.into(), spec);
        self
    }

    /// Returns true if the table declares `column`.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Mapping from table name to its definition, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: IndexMap<String, TableSchema>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table. Re-adding a name replaces the definition but keeps its
    /// original position.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>, table: TableSchema) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Returns the definition of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Iterates tables in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableSchema)> {
        self.tables.iter().map(|(name, t)| (name.as_str(), t))
    }

    /// Returns true if no tables are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the alias a table is referenced by: its declared alias, or its
    /// name.
    #[must_use]
    pub fn qualifier<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name)
            .and_then(|t| t.alias.as_deref())
            .unwrap_or(name)
    }
}

//! # oxide-odata
//!
//! Compiles OData-style query strings into parameterized SQL `SELECT`
//! statements.
//!
//! This crate provides:
//! - A hand-written lexer and recursive descent parser for `$filter`
//! - Schema-aware column resolution and join planning
//! - `$select`, `$orderby`, `$top`, `$skip`, `$expand` and `$apply` support
//! - `?` or `$n` placeholders, assigned while the statement is rendered
//!
//! ## Compiling a query
//!
//! ```rust
//! use oxide_odata::{compile, CompileOptions, SqlValue};
//!
//! let options = CompileOptions::new("users").alias("u");
//! let query = compile(
//!     "$select=name,age&$filter=age gt 18 and city eq 'Vienna'&$orderby=age desc",
//!     &options,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     query.sql,
//!     "SELECT u.name, u.age FROM users u WHERE (u.age > ? AND u.city = ?) ORDER BY u.age desc"
//! );
//! assert_eq!(query.params, vec![SqlValue::Int(18), SqlValue::from("Vienna")]);
//! ```
//!
//! ## Schemas and joins
//!
//! A [`Schema`] tells the compiler which table owns which column. Columns of
//! joined tables are qualified with the join alias, and a declared join is
//! only rendered when something references it:
//!
//! ```rust
//! use oxide_odata::{compile, CompileOptions, JoinSpec, Schema, TableSchema};
//!
//! let schema = Schema::new()
//!     .table(
//!         "users",
//!         TableSchema::new(["id", "name", "role_id"])
//!             .alias("u")
//!             .join("roles", JoinSpec::left("u.role_id = r.id").alias("r")),
//!     )
//!     .table("roles", TableSchema::new(["label"]).alias("r"));
//! let options = CompileOptions::new("users").schema(schema);
//!
//! let query = compile("$select=name,label", &options).unwrap();
//! assert_eq!(
//!     query.sql,
//!     "SELECT u.name, r.label FROM users u LEFT JOIN roles r ON u.role_id = r.id"
//! );
//!
//! let query = compile("$select=name", &options).unwrap();
//! assert_eq!(query.sql, "SELECT u.name FROM users u");
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Filter literals are never inlined. Identifiers outside `$filter` must be
//! plain (optionally dot-qualified) names:
//!
//! ```rust
//! use oxide_odata::{compile, CompileOptions, SqlValue};
//!
//! let options = CompileOptions::new("users");
//! let query = compile("$filter=name eq ''';DROP TABLE users;--'", &options).unwrap();
//! assert_eq!(query.sql, "SELECT * FROM users WHERE name = ?");
//! assert_eq!(query.params, vec![SqlValue::from("';DROP TABLE users;--")]);
//!
//! assert!(compile("$select=name;DROP TABLE users", &options).is_err());
//! ```

pub mod apply;
pub mod ast;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod expand;
pub mod join;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod value;

pub use apply::{parse_apply, AggregateDef, AggregateFunc, ApplySpec};
pub use ast::{CompareOp, FilterExpr, LogicalOp};
pub use compiler::{compile, CompileOptions, CompiledQuery, QueryCompiler};
pub use dialect::{Dialect, MySqlDialect, PlaceholderStyle, PostgresDialect, SqlWriter};
pub use error::{CompileError, Result};
pub use expand::{parse_expand, Expansion};
pub use parser::{parse_filter, ParseError, Parser};
pub use query::{QueryInput, QueryParams, RequestLike};
pub use schema::{JoinSpec, JoinType, Schema, TableSchema};
pub use value::SqlValue;

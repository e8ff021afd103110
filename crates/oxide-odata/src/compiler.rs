//! Query compiler.
//!
//! Sequences the directive parsers, resolves every column reference through
//! the schema, plans the joins those references need and renders the final
//! statement:
//!
//! ```text
//! SELECT cols FROM table [alias] [joins] [WHERE ..] [GROUP BY ..] [ORDER BY ..] [LIMIT n] [OFFSET n]
//! ```
//!
//! Directive values that are empty are treated as absent.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::apply::{parse_apply, ApplySpec};
use crate::ast::FilterExpr;
use crate::dialect::{PlaceholderStyle, SqlWriter};
use crate::error::{CompileError, Result};
use crate::expand::{parse_expand, Expansion};
use crate::join::JoinPlanner;
use crate::parser::parse_filter;
use crate::query::{QueryInput, QueryParams};
use crate::resolver::{check_identifier, Resolver};
use crate::schema::Schema;
use crate::value::SqlValue;

const SELECT: &str = "$select";
const FILTER: &str = "$filter";
const ORDER_BY: &str = "$orderby";
const TOP: &str = "$top";
const SKIP: &str = "$skip";
const EXPAND: &str = "$expand";
const APPLY: &str = "$apply";

/// Compilation options.
///
/// Deserializes from JSON with camelCase keys, every key optional:
///
/// ```json
/// { "table": "users", "alias": "u", "schema": {}, "placeholderStyle": "postgres" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Primary table.
    pub table: String,
    /// Alias of the primary table. Falls back to the schema alias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Table and relationship schema.
    pub schema: Schema,
    /// Placeholder syntax.
    pub placeholder_style: PlaceholderStyle,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            table: String::from("my_table"),
            alias: None,
            schema: Schema::default(),
            placeholder_style: PlaceholderStyle::default(),
        }
    }
}

impl CompileOptions {
    /// Creates options for `table` with everything else defaulted.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Sets the primary table alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the placeholder style.
    #[must_use]
    pub const fn placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder_style = style;
        self
    }

    /// Returns the alias the primary table is referenced by: the configured
    /// alias, else the alias the schema declares for it.
    #[must_use]
    pub fn effective_alias(&self) -> Option<&str> {
        self.alias.as_deref().or_else(|| {
            self.schema
                .get(&self.table)
                .and_then(|t| t.alias.as_deref())
        })
    }
}

/// A compiled statement and its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    /// SQL text.
    pub sql: String,
    /// Bound parameters.
    pub params: Vec<SqlValue>,
}

/// Compiles `input` with `options`.
///
/// # Errors
///
/// Returns the first `CompileError` raised by any directive.
///
/// # Example
///
/// ```rust
/// use oxide_odata::{compile, CompileOptions};
///
/// let query = compile("$filter=age gt 10&$top=5", &CompileOptions::new("users")).unwrap();
/// assert_eq!(query.sql, "SELECT * FROM users WHERE age > ? LIMIT 5");
/// ```
pub fn compile(input: impl Into<QueryInput>, options: &CompileOptions) -> Result<CompiledQuery> {
    QueryCompiler::new(options).compile(&input.into())
}

/// Projection produced by `$select`/`$expand` or by `$apply`.
#[derive(Debug, Default)]
struct Projection {
    columns: Vec<String>,
    group_by: Vec<String>,
    /// Resolved column references, used for join planning.
    references: Vec<String>,
}

/// Compiles queries against one set of options.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    options: &'a CompileOptions,
    alias: Option<&'a str>,
    resolver: Resolver<'a>,
    planner: JoinPlanner<'a>,
}

impl<'a> QueryCompiler<'a> {
    /// Creates a compiler for `options`.
    #[must_use]
    pub fn new(options: &'a CompileOptions) -> Self {
        let alias = options.effective_alias();
        Self {
            options,
            alias,
            resolver: Resolver::new(&options.schema, &options.table, alias),
            planner: JoinPlanner::new(&options.schema, &options.table),
        }
    }

    /// Compiles any supported query input.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidUrl` for unparsable request URLs, and
    /// otherwise fails like [`compile_params`](Self::compile_params).
    pub fn compile(&self, input: &QueryInput) -> Result<CompiledQuery> {
        let params = input.to_params()?;
        self.compile_params(&params)
    }

    /// Compiles already parsed query parameters.
    ///
    /// # Errors
    ///
    /// Returns the first `CompileError` raised by any directive.
    pub fn compile_params(&self, params: &QueryParams) -> Result<CompiledQuery> {
        let table = self.options.table.as_str();
        check_identifier(table, "table")?;
        if let Some(alias) = self.alias {
            check_identifier(alias, "alias")?;
        }

        let dialect = self.options.placeholder_style.dialect();
        debug!(table, alias = ?self.alias, dialect = dialect.name(), "compiling query");

        let expansions = directive(params, EXPAND)
            .map(parse_expand)
            .transpose()?
            .unwrap_or_default();
        let expansion_columns = self.expansion_columns(&expansions)?;

        let projection = if let Some(apply) = directive(params, APPLY) {
            if directive(params, SELECT).is_some() {
                debug!("$select ignored because $apply is present");
            }
            self.apply_projection(&parse_apply(apply)?)
        } else {
            self.select_projection(directive(params, SELECT), expansion_columns)?
        };

        let filter = directive(params, FILTER)
            .map(|f| parse_filter(f).map(|expr| self.resolve_filter(expr)))
            .transpose()?;
        if let Some(filter) = &filter {
            debug!(params = filter.param_count(), "parsed $filter");
        }
        let order_by = directive(params, ORDER_BY)
            .map(|o| self.order_by(o))
            .transpose()?
            .unwrap_or_default();
        let limit = directive(params, TOP).map(|v| paging(TOP, v)).transpose()?;
        let offset = directive(params, SKIP).map(|v| paging(SKIP, v)).transpose()?;

        let expanded: Vec<&str> = expansions.iter().map(|e| e.table.as_str()).collect();
        let references = projection
            .references
            .iter()
            .map(String::as_str)
            .chain(filter.iter().flat_map(FilterExpr::fields))
            .chain(order_by.iter().map(|(field, _)| field.as_str()));
        let joins = self.planner.plan(references, &expanded);
        debug!(joins = joins.len(), "planned joins");

        let mut w = SqlWriter::new(dialect);
        w.push_str("SELECT ");
        w.push_str(&projection.columns.join(", "));
        w.push_str(" FROM ");
        w.push_str(table);
        if let Some(alias) = self.alias.filter(|a| *a != table) {
            w.push_str(" ");
            w.push_str(alias);
        }
        for join in &joins {
            w.push_str(" ");
            join.write_sql(&mut w);
        }
        if let Some(filter) = &filter {
            w.push_str(" WHERE ");
            filter.write_sql(&mut w);
        }
        if !projection.group_by.is_empty() {
            w.push_str(" GROUP BY ");
            w.push_str(&projection.group_by.join(", "));
        }
        if !order_by.is_empty() {
            let entries: Vec<String> = order_by
                .iter()
                .map(|(field, dir)| {
                    dir.map_or_else(|| field.clone(), |dir| format!("{field} {dir}"))
                })
                .collect();
            w.push_str(" ORDER BY ");
            w.push_str(&entries.join(", "));
        }
        if let Some(limit) = limit {
            w.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            w.push_str(&format!(" OFFSET {offset}"));
        }

        let (sql, params) = w.finish();
        let sql = sql.split_whitespace().collect::<Vec<_>>().join(" ");
        debug!(params = params.len(), "compiled query");
        trace!(
            %sql,
            params = %params
                .iter()
                .map(SqlValue::to_sql_inline)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(CompiledQuery { sql, params })
    }

    /// Qualifies each expansion's selects with its join alias.
    fn expansion_columns(&self, expansions: &[Expansion]) -> Result<Vec<String>> {
        let mut columns = Vec::new();
        for expansion in expansions {
            let alias = self.planner.join_alias(&expansion.table).ok_or_else(|| {
                CompileError::UnknownRelation {
                    table: self.options.table.clone(),
                    relation: expansion.table.clone(),
                }
            })?;
            columns.extend(expansion.selects.iter().map(|field| {
                if field.contains('.') {
                    field.clone()
                } else {
                    format!("{alias}.{field}")
                }
            }));
        }
        Ok(columns)
    }

    fn select_projection(
        &self,
        select: Option<&str>,
        expansion_columns: Vec<String>,
    ) -> Result<Projection> {
        let mut columns = Vec::new();
        match select {
            None => columns.push(String::from("*")),
            Some(select) => {
                for field in select.split(',').map(str::trim) {
                    if field == "*" {
                        columns.push(String::from("*"));
                    } else {
                        check_identifier(field, SELECT)?;
                        columns.push(self.resolver.resolve(field));
                    }
                }
            }
        }
        columns.extend(expansion_columns);

        Ok(Projection {
            references: columns.clone(),
            columns,
            group_by: Vec::new(),
        })
    }

    fn apply_projection(&self, spec: &ApplySpec) -> Projection {
        let group_by: Vec<String> = spec
            .group_by_fields
            .iter()
            .map(|f| self.resolver.resolve(f))
            .collect();
        let mut columns = group_by.clone();
        let mut references = group_by.clone();

        for def in &spec.aggregate_defs {
            let column = if def.is_wildcard() {
                String::from("*")
            } else {
                self.resolver.resolve(&def.field)
            };
            columns.push(def.to_sql(&column));
            references.push(column);
        }

        Projection {
            columns,
            group_by,
            references,
        }
    }

    fn resolve_filter(&self, expr: FilterExpr) -> FilterExpr {
        expr.map_fields(&mut |field| self.resolver.resolve(field))
    }

    /// Parses `field [asc|desc], ...`, keeping directions as written.
    fn order_by<'p>(&self, value: &'p str) -> Result<Vec<(String, Option<&'p str>)>> {
        value
            .split(',')
            .map(|entry| {
                let mut parts = entry.split_whitespace();
                let (Some(field), dir, None) = (parts.next(), parts.next(), parts.next()) else {
                    return Err(CompileError::InvalidOrderBy(String::from(entry.trim())));
                };
                if let Some(dir) = dir {
                    if !dir.eq_ignore_ascii_case("asc") && !dir.eq_ignore_ascii_case("desc") {
                        return Err(CompileError::InvalidOrderBy(String::from(entry.trim())));
                    }
                }
                check_identifier(field, ORDER_BY)?;
                Ok((self.resolver.resolve(field), dir))
            })
            .collect()
    }
}

/// Returns the value of `key`, treating empty values as absent.
fn directive<'p>(params: &'p QueryParams, key: &str) -> Option<&'p str> {
    params.get(key).filter(|v| !v.trim().is_empty())
}

fn paging(directive: &'static str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| CompileError::InvalidPaging {
            directive,
            value: String::from(value),
        })
}

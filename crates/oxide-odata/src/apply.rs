//! `$apply` aggregation.
//!
//! Only the grouped-aggregate form is understood:
//!
//! ```text
//! groupby((city,country), aggregate(age with average as AvgAge, id with count as Total))
//! ```
//!
//! When present, `$apply` replaces the `$select` projection with the group
//! keys followed by one column per aggregate, and adds a `GROUP BY` clause.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CompileError, Result};
use crate::resolver::check_identifier;

static APPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*groupby\(\s*\(([^()]*)\)\s*,\s*aggregate\(([^()]*)\)\s*\)\s*$")
        .expect("apply pattern is valid")
});

static AGGREGATE_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+with\s+([A-Za-z_][A-Za-z0-9_]*)\s+as\s+(\S+)$")
        .expect("aggregate pattern is valid")
});

/// Aggregate function named in an `aggregate(...)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateFunc {
    /// `average` (AVG)
    Average,
    /// `sum` (SUM)
    Sum,
    /// `count` (COUNT)
    Count,
    /// `min` (MIN)
    Min,
    /// `max` (MAX)
    Max,
    /// Any other function, passed through uppercased.
    Other(String),
}

impl AggregateFunc {
    /// Maps a function name to its aggregate.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "average" => Self::Average,
            "sum" => Self::Sum,
            "count" => Self::Count,
            "min" => Self::Min,
            "max" => Self::Max,
            other => Self::Other(other.to_uppercase()),
        }
    }

    /// Returns the SQL function name.
    #[must_use]
    pub fn as_sql(&self) -> &str {
        match self {
            Self::Average => "AVG",
            Self::Sum => "SUM",
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One `field with func as alias` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDef {
    /// Aggregated field, or `*` for `count`.
    pub field: String,
    /// Aggregate function.
    pub func: AggregateFunc,
    /// Output column alias.
    pub alias: String,
}

impl AggregateDef {
    /// Returns true if the aggregate runs over all rows (`COUNT(*)`).
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.field == "*"
    }

    /// Renders `FUNC(column) AS alias` for an already resolved column.
    #[must_use]
    pub fn to_sql(&self, column: &str) -> String {
        format!("{}({column}) AS {}", self.func, self.alias)
    }
}

/// Parsed `$apply` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplySpec {
    /// Group keys, in request order.
    pub group_by_fields: Vec<String>,
    /// Aggregates, in request order.
    pub aggregate_defs: Vec<AggregateDef>,
}

/// Parses an `$apply` value.
///
/// # Errors
///
/// Returns `CompileError::InvalidApply` if the input does not have the
/// `groupby((...), aggregate(...))` shape or an entry is malformed, and
/// `CompileError::InvalidIdentifier` for bad field or alias names.
pub fn parse_apply(input: &str) -> Result<ApplySpec> {
    let caps = APPLY.captures(input).ok_or_else(|| {
        CompileError::InvalidApply(format!(
            "expected 'groupby((fields), aggregate(field with func as alias, ...))', got '{input}'"
        ))
    })?;

    let group_by_fields = caps[1]
        .split(',')
        .map(str::trim)
        .map(|field| {
            check_identifier(field, "$apply")?;
            Ok(String::from(field))
        })
        .collect::<Result<Vec<_>>>()?;

    let aggregate_defs = caps[2]
        .split(',')
        .map(parse_aggregate_def)
        .collect::<Result<Vec<_>>>()?;

    Ok(ApplySpec {
        group_by_fields,
        aggregate_defs,
    })
}

fn parse_aggregate_def(entry: &str) -> Result<AggregateDef> {
    let entry = entry.trim();
    let caps = AGGREGATE_DEF.captures(entry).ok_or_else(|| {
        CompileError::InvalidApply(format!(
            "expected 'field with func as alias', got '{entry}'"
        ))
    })?;

    let field = &caps[1];
    let func = AggregateFunc::from_name(&caps[2]);
    let alias = &caps[3];

    if field == "*" {
        if func != AggregateFunc::Count {
            return Err(CompileError::InvalidApply(format!(
                "'*' can only be counted, got '{entry}'"
            )));
        }
    } else {
        check_identifier(field, "$apply")?;
    }
    if alias.contains('.') {
        return Err(CompileError::InvalidIdentifier {
            directive: "$apply",
            name: String::from(alias),
        });
    }
    check_identifier(alias, "$apply")?;

    Ok(AggregateDef {
        field: String::from(field),
        func,
        alias: String::from(alias),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_group_and_aggregate() {
        let spec = parse_apply("groupby((city), aggregate(age with average as AvgAge))").unwrap();
        assert_eq!(spec.group_by_fields, vec![String::from("city")]);
        assert_eq!(
            spec.aggregate_defs,
            vec![AggregateDef {
                field: String::from("age"),
                func: AggregateFunc::Average,
                alias: String::from("AvgAge"),
            }]
        );
    }

    #[test]
    fn test_parse_multiple_entries() {
        let spec = parse_apply(
            "groupby((city, country), aggregate(age with max as Oldest, * with count as Total))",
        )
        .unwrap();
        assert_eq!(spec.group_by_fields, vec!["city", "country"]);
        assert_eq!(spec.aggregate_defs.len(), 2);
        assert!(spec.aggregate_defs[1].is_wildcard());
        assert_eq!(spec.aggregate_defs[1].to_sql("*"), "COUNT(*) AS Total");
    }

    #[test]
    fn test_function_mapping() {
        let cases = [
            ("average", "AVG"),
            ("sum", "SUM"),
            ("count", "COUNT"),
            ("min", "MIN"),
            ("max", "MAX"),
            ("stddev", "STDDEV"),
        ];
        for (name, sql) in cases {
            assert_eq!(AggregateFunc::from_name(name).as_sql(), sql);
        }
    }

    #[test]
    fn test_render_aggregate() {
        let def = AggregateDef {
            field: String::from("age"),
            func: AggregateFunc::Sum,
            alias: String::from("TotalAge"),
        };
        assert_eq!(def.to_sql("u.age"), "SUM(u.age) AS TotalAge");
    }

    #[test]
    fn test_missing_aggregate_is_rejected() {
        assert!(matches!(
            parse_apply("groupby((city))"),
            Err(CompileError::InvalidApply(_))
        ));
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        assert!(matches!(
            parse_apply("groupby((city), aggregate(age average AvgAge))"),
            Err(CompileError::InvalidApply(_))
        ));
        assert!(matches!(
            parse_apply("groupby((city), aggregate())"),
            Err(CompileError::InvalidApply(_))
        ));
        assert!(matches!(
            parse_apply("groupby((), aggregate(age with sum as s))"),
            Err(CompileError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            parse_apply("groupby((city), aggregate(* with sum as s))"),
            Err(CompileError::InvalidApply(_))
        ));
        assert!(parse_apply("filter(age gt 1)").is_err());
    }

    #[test]
    fn test_injection_in_alias_is_rejected() {
        assert!(parse_apply("groupby((city), aggregate(age with sum as s;DROP))").is_err());
    }
}

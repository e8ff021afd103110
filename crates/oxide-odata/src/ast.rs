//! Filter expression AST.
//!
//! A `$filter` string parses into a [`FilterExpr`] tree. Field names are
//! rewritten through the schema resolver on the tree itself
//! ([`FilterExpr::map_fields`]) before anything is rendered, and rendering
//! binds every literal through a [`SqlWriter`].

use std::fmt;

use crate::dialect::{MySqlDialect, SqlWriter};
use crate::lexer::Keyword;
use crate::value::SqlValue;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `eq` (=)
    Eq,
    /// `ne` (<>)
    Ne,
    /// `gt` (>)
    Gt,
    /// `ge` (>=)
    Ge,
    /// `lt` (<)
    Lt,
    /// `le` (<=)
    Le,
}

impl CompareOp {
    /// Maps a comparison keyword to its operator.
    #[must_use]
    pub const fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Eq => Some(Self::Eq),
            Keyword::Ne => Some(Self::Ne),
            Keyword::Gt => Some(Self::Gt),
            Keyword::Ge => Some(Self::Ge),
            Keyword::Lt => Some(Self::Lt),
            Keyword::Le => Some(Self::Le),
            _ => None,
        }
    }

    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Logical connectives. AND binds tighter than OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// AND
    And,
    /// OR
    Or,
}

impl LogicalOp {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A boolean filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `field op value`. Contributes exactly one parameter.
    Comparison {
        field: String,
        op: CompareOp,
        value: SqlValue,
    },
    /// `left op right`, rendered inside parentheses.
    Logical {
        op: LogicalOp,
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
    /// `not expr`
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Creates a comparison node.
    #[must_use]
    pub fn comparison(
        field: impl Into<String>,
        op: CompareOp,
        value: impl Into<SqlValue>,
    ) -> Self {
        Self::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Combines two expressions with AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::Logical {
            op: LogicalOp::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Combines two expressions with OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Logical {
            op: LogicalOp::Or,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Negates the expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Returns every field referenced, in textual order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Comparison { field, .. } => out.push(field),
            Self::Logical { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Self::Not(inner) => inner.collect_fields(out),
        }
    }

    /// Returns the number of parameters this expression binds.
    #[must_use]
    pub fn param_count(&self) -> usize {
        match self {
            Self::Comparison { .. } => 1,
            Self::Logical { left, right, .. } => left.param_count() + right.param_count(),
            Self::Not(inner) => inner.param_count(),
        }
    }

    /// Rewrites every field name with `f`, keeping the tree shape.
    #[must_use]
    pub fn map_fields<F>(self, f: &mut F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        match self {
            Self::Comparison { field, op, value } => Self::Comparison {
                field: f(&field),
                op,
                value,
            },
            Self::Logical { op, left, right } => Self::Logical {
                op,
                left: Box::new(left.map_fields(f)),
                right: Box::new(right.map_fields(f)),
            },
            Self::Not(inner) => Self::Not(Box::new(inner.map_fields(f))),
        }
    }

    /// Renders the expression into `w`, binding literals as parameters.
    pub fn write_sql(&self, w: &mut SqlWriter<'_>) {
        match self {
            Self::Comparison { field, op, value } => {
                w.push_str(field);
                w.push_str(" ");
                w.push_str(op.as_sql());
                w.push_str(" ");
                w.push_param(value.clone());
            }
            Self::Logical { op, left, right } => {
                w.push_str("(");
                left.write_sql(w);
                w.push_str(" ");
                w.push_str(op.as_sql());
                w.push_str(" ");
                right.write_sql(w);
                w.push_str(")");
            }
            Self::Not(inner) => {
                w.push_str("NOT ");
                if matches!(**inner, Self::Logical { .. }) {
                    inner.write_sql(w);
                } else {
                    w.push_str("(");
                    inner.write_sql(w);
                    w.push_str(")");
                }
            }
        }
    }

    /// Builds the SQL fragment with `?` placeholders and its parameters.
    #[must_use]
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        let mut w = SqlWriter::new(&MySqlDialect);
        self.write_sql(&mut w);
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_comparison() {
        let expr = FilterExpr::comparison("age", CompareOp::Gt, 10_i64);
        let (sql, params) = expr.build();
        assert_eq!(sql, "age > ?");
        assert_eq!(params, vec![SqlValue::Int(10)]);
    }

    #[test]
    fn test_operator_mapping() {
        let ops = [
            (CompareOp::Eq, "="),
            (CompareOp::Ne, "<>"),
            (CompareOp::Gt, ">"),
            (CompareOp::Ge, ">="),
            (CompareOp::Lt, "<"),
            (CompareOp::Le, "<="),
        ];
        for (op, sql) in ops {
            assert_eq!(op.to_string(), sql);
        }
        assert_eq!(CompareOp::from_keyword(Keyword::Ge), Some(CompareOp::Ge));
        assert_eq!(CompareOp::from_keyword(Keyword::And), None);
        assert_eq!(CompareOp::from_keyword(Keyword::Null), None);
    }

    #[test]
    fn test_logical_nodes_are_parenthesized() {
        let expr = FilterExpr::comparison("a", CompareOp::Gt, 1_i64)
            .and(FilterExpr::comparison("b", CompareOp::Eq, 2_i64))
            .or(FilterExpr::comparison("c", CompareOp::Eq, 3_i64));
        let (sql, params) = expr.build();
        assert_eq!(sql, "((a > ? AND b = ?) OR c = ?)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_not_wraps_comparison_once() {
        let single = FilterExpr::comparison("a", CompareOp::Eq, 1_i64).not();
        assert_eq!(single.build().0, "NOT (a = ?)");

        let grouped = FilterExpr::comparison("a", CompareOp::Eq, 1_i64)
            .or(FilterExpr::comparison("b", CompareOp::Eq, 2_i64))
            .not();
        assert_eq!(grouped.build().0, "NOT (a = ? OR b = ?)");
    }

    #[test]
    fn test_map_fields_and_fields_order() {
        let expr = FilterExpr::comparison("age", CompareOp::Gt, 18_i64)
            .and(FilterExpr::comparison("city", CompareOp::Eq, "Vienna"));
        let mapped = expr.map_fields(&mut |f| format!("u.{f}"));
        assert_eq!(mapped.fields(), vec!["u.age", "u.city"]);
        assert_eq!(mapped.param_count(), 2);
        assert_eq!(mapped.build().0, "(u.age > ? AND u.city = ?)");
    }

    #[test]
    fn test_literal_question_mark_is_a_parameter() {
        let expr = FilterExpr::comparison("note", CompareOp::Eq, "why?");
        let (sql, params) = expr.build();
        assert_eq!(sql.matches('?').count(), 1);
        assert_eq!(params, vec![SqlValue::from("why?")]);
    }
}

//! Tests for `$filter` compilation.

mod common;
use common::*;

use oxide_odata::{parse_filter, CompileError, CompileOptions, SqlValue};

#[test]
fn single_comparison() {
    let q = compile_ok("$filter=age gt 10", &CompileOptions::new("users"));
    assert_eq!(q.sql, "SELECT * FROM users WHERE age > ?");
    assert_eq!(q.params, vec![SqlValue::Int(10)]);
}

#[test]
fn every_operator() {
    let cases = [
        ("eq", "="),
        ("ne", "<>"),
        ("gt", ">"),
        ("ge", ">="),
        ("lt", "<"),
        ("le", "<="),
    ];
    for (op, sql_op) in cases {
        assert_eq!(
            sql(&format!("$filter=a {op} 1"), "t"),
            format!("SELECT * FROM t WHERE a {sql_op} ?")
        );
    }
}

#[test]
fn and_with_alias() {
    let q = compile_ok(
        "$select=name,age&$filter=age gt 18 and city eq 'Vienna'&$orderby=age desc",
        &CompileOptions::new("users").alias("u"),
    );
    assert_eq!(
        q.sql,
        "SELECT u.name, u.age FROM users u WHERE (u.age > ? AND u.city = ?) ORDER BY u.age desc"
    );
    assert_eq!(q.params, vec![SqlValue::Int(18), text("Vienna")]);
}

#[test]
fn and_binds_tighter_than_or() {
    assert_eq!(
        sql("$filter=a gt 1 and b eq 2 or c eq 3", "t"),
        "SELECT * FROM t WHERE ((a > ? AND b = ?) OR c = ?)"
    );
    assert_eq!(
        sql("$filter=a gt 1 or b eq 2 and c eq 3", "t"),
        "SELECT * FROM t WHERE (a > ? OR (b = ? AND c = ?))"
    );
}

#[test]
fn explicit_grouping_and_not() {
    assert_eq!(
        sql("$filter=(a eq 1 or b eq 2) and not c eq 3", "t"),
        "SELECT * FROM t WHERE ((a = ? OR b = ?) AND NOT (c = ?))"
    );
}

#[test]
fn keywords_are_case_insensitive() {
    assert_eq!(
        sql("$filter=a GT 1 AND b Eq TRUE", "t"),
        "SELECT * FROM t WHERE (a > ? AND b = ?)"
    );
}

#[test]
fn literal_kinds_are_all_parameters() {
    let q = compile_ok(
        "$filter=s eq 'it''s' and i eq -4 and f lt 2.5 and b eq false and n eq null",
        &CompileOptions::new("t"),
    );
    assert_eq!(
        q.params,
        vec![
            text("it's"),
            SqlValue::Int(-4),
            SqlValue::Float(2.5),
            SqlValue::Bool(false),
            SqlValue::Null,
        ]
    );
    assert!(!q.sql.contains("it"));
    assert_placeholders_match(&q);
}

#[test]
fn string_literal_with_question_mark_and_keywords() {
    let q = compile_ok(
        "$filter=note eq 'and or ? eq'",
        &CompileOptions::new("t").alias("x"),
    );
    assert_eq!(q.sql, "SELECT * FROM t x WHERE x.note = ?");
    assert_eq!(q.params, vec![text("and or ? eq")]);
}

#[test]
fn percent_encoded_filter() {
    let q = compile_ok(
        "$filter=city%20eq%20%27Vienna%27",
        &CompileOptions::new("users"),
    );
    assert_eq!(q.sql, "SELECT * FROM users WHERE city = ?");
    assert_eq!(q.params, vec![text("Vienna")]);
}

#[test]
fn qualified_field_escapes_reserved_words() {
    let q = compile_ok("$filter=u.eq eq 1", &options("users", users_roles()));
    assert_eq!(q.sql, "SELECT * FROM users u WHERE u.eq = ?");
}

#[test]
fn placeholder_count_matches_params() {
    let filters = [
        "a eq 1",
        "a eq 1 and b eq 'x'",
        "(a eq 1 or b eq 2) and (c eq 3 or not d eq 4)",
        "a eq 'what?' or b eq '??'",
    ];
    for filter in filters {
        let (sql, params) = parse_filter(filter).unwrap().build();
        assert_eq!(sql.matches('?').count(), params.len(), "{filter}");
    }
}

#[test]
fn syntax_errors() {
    let options = CompileOptions::new("t");
    for filter in [
        "age gt",
        "age gt 10 and",
        "(age gt 10",
        "age gt 10)",
        "age equals 10",
        "age gt 10 age lt 3",
        "name eq 'open",
        "or a eq 1",
    ] {
        let err = compile_err(format!("$filter={filter}"), &options);
        assert!(matches!(err, CompileError::FilterSyntax(_)), "{filter}: {err}");
    }
}

#[test]
fn syntax_error_reports_position() {
    let err = compile_err("$filter=age equals 10", &CompileOptions::new("t"));
    let CompileError::FilterSyntax(parse) = err else {
        panic!("Expected filter syntax error");
    };
    assert_eq!((parse.span.start, parse.span.end), (4, 10));
    assert!(parse.to_string().contains("Unknown operator 'equals'"));
}

#[test]
fn deeply_nested_filter_is_rejected() {
    let options = CompileOptions::new("t");
    let parens = format!("$filter={}a eq 1{}", "(".repeat(3000), ")".repeat(3000));
    let nots = format!("$filter={}a eq 1", "not ".repeat(3000));
    for query in [parens, nots] {
        let err = compile_err(query.as_str(), &options);
        let CompileError::FilterSyntax(parse) = err else {
            panic!("expected a filter syntax error, got {err}");
        };
        assert!(parse.message.contains("nested too deeply"));
    }
}

#[test]
fn long_connective_chain_is_rejected() {
    let chain = vec!["a eq 1"; 5000].join(" and ");
    let err = compile_err(format!("$filter={chain}"), &CompileOptions::new("t"));
    assert!(matches!(err, CompileError::FilterSyntax(_)));
}

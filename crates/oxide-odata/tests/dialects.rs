//! Tests for placeholder dialects.

mod common;
use common::*;

use oxide_odata::{CompileOptions, PlaceholderStyle, SqlValue};

#[test]
fn postgres_numbers_placeholders() {
    let options = CompileOptions::new("users")
        .alias("u")
        .placeholder_style(PlaceholderStyle::Postgres);
    let q = compile_ok("$filter=age gt 30 and city eq 'Vienna'", &options);
    assert_eq!(
        q.sql,
        "SELECT * FROM users u WHERE (u.age > $1 AND u.city = $2)"
    );
    assert_eq!(q.params, vec![SqlValue::Int(30), text("Vienna")]);
}

#[test]
fn mysql_is_the_default() {
    let q = compile_ok(
        "$filter=age gt 30 and city eq 'Vienna'",
        &CompileOptions::new("users").alias("u"),
    );
    assert_eq!(q.sql, "SELECT * FROM users u WHERE (u.age > ? AND u.city = ?)");
}

#[test]
fn postgres_numbering_follows_textual_order() {
    let options = CompileOptions::new("t").placeholder_style(PlaceholderStyle::Postgres);
    let q = compile_ok(
        "$filter=(a eq 1 or b eq 2) and (c eq 3 or not d eq 4)",
        &options,
    );
    assert_eq!(
        q.sql,
        "SELECT * FROM t WHERE ((a = $1 OR b = $2) AND (c = $3 OR NOT (d = $4)))"
    );
    assert_eq!(
        q.params,
        vec![
            SqlValue::Int(1),
            SqlValue::Int(2),
            SqlValue::Int(3),
            SqlValue::Int(4)
        ]
    );
}

#[test]
fn postgres_ignores_question_marks_in_literals() {
    let options = CompileOptions::new("t").placeholder_style(PlaceholderStyle::Postgres);
    let q = compile_ok("$filter=a eq '?' and b eq 'x?y'", &options);
    assert_eq!(q.sql, "SELECT * FROM t WHERE (a = $1 AND b = $2)");
    assert_eq!(q.params, vec![text("?"), text("x?y")]);
}

#[test]
fn postgres_with_joins_and_paging() {
    let options = options("users", users_roles()).placeholder_style(PlaceholderStyle::Postgres);
    let q = compile_ok(
        "$select=name&$filter=label eq 'admin'&$top=1",
        &options,
    );
    assert_eq!(
        q.sql,
        "SELECT u.name FROM users u LEFT JOIN roles r ON u.role_id = r.id WHERE r.label = $1 LIMIT 1"
    );
}

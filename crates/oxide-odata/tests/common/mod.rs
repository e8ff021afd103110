#![allow(dead_code)]

use oxide_odata::{
    compile, CompileError, CompileOptions, CompiledQuery, JoinSpec, QueryInput, Schema, SqlValue,
    TableSchema,
};

pub fn compile_ok(input: impl Into<QueryInput>, options: &CompileOptions) -> CompiledQuery {
    let input = input.into();
    compile(input.clone(), options)
        .unwrap_or_else(|e| panic!("Failed to compile: {input:?}\nError: {e}"))
}

pub fn compile_err(input: impl Into<QueryInput>, options: &CompileOptions) -> CompileError {
    let input = input.into();
    compile(input.clone(), options).expect_err(&format!("Expected compile error for: {input:?}"))
}

/// Compiles against `table` with no schema and returns the SQL.
pub fn sql(query: &str, table: &str) -> String {
    compile_ok(query, &CompileOptions::new(table)).sql
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::from(s)
}

/// users (alias u) with a LEFT join to roles (alias r).
pub fn users_roles() -> Schema {
    Schema::new()
        .table(
            "users",
            TableSchema::new(["id", "name", "email", "role_id"])
                .alias("u")
                .join("roles", JoinSpec::left("u.role_id = r.id").alias("r")),
        )
        .table("roles", TableSchema::new(["id", "label"]).alias("r"))
}

/// users (alias u) with age and city, no joins.
pub fn users_stats() -> Schema {
    Schema::new().table(
        "users",
        TableSchema::new(["id", "name", "age", "city"]).alias("u"),
    )
}

/// orders (alias o) joining customers and products.
pub fn shop() -> Schema {
    Schema::new()
        .table(
            "orders",
            TableSchema::new(["id", "customer_id", "product_id", "total", "created_at"])
                .alias("o")
                .join(
                    "customers",
                    JoinSpec::inner("o.customer_id = c.id").alias("c"),
                )
                .join("products", JoinSpec::left("o.product_id = p.id")),
        )
        .table(
            "customers",
            TableSchema::new(["name", "country"]).alias("c"),
        )
        .table("products", TableSchema::new(["title", "price"]).alias("p"))
}

pub fn options(table: &str, schema: Schema) -> CompileOptions {
    CompileOptions::new(table).schema(schema)
}

/// Asserts that the number of `?` placeholders matches the parameter count.
pub fn assert_placeholders_match(query: &CompiledQuery) {
    assert_eq!(
        query.sql.matches('?').count(),
        query.params.len(),
        "placeholder mismatch in: {}",
        query.sql
    );
}

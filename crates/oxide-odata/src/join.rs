//! Join planning.
//!
//! A declared join is rendered only when the query needs it: the relation is
//! named in `$expand`, or some rendered column reference is qualified with the
//! joined table's alias. Joins are emitted in the order the primary table
//! declares them and never more than once.

use std::collections::HashSet;

use tracing::trace;

use crate::dialect::SqlWriter;
use crate::resolver::qualifier_of;
use crate::schema::{JoinSpec, JoinType, Schema};

/// A join selected for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedJoin<'a> {
    /// Joined table name.
    pub table: &'a str,
    /// Alias the joined table is referenced by.
    pub alias: &'a str,
    /// Declared join.
    pub spec: &'a JoinSpec,
}

impl PlannedJoin<'_> {
    /// Writes `{TYPE} JOIN table [alias] [ON predicate]`.
    ///
    /// The alias is omitted when it equals the table name, and `CROSS` joins
    /// take no predicate.
    pub fn write_sql(&self, w: &mut SqlWriter<'_>) {
        w.push_str(self.spec.kind.as_sql());
        w.push_str(" JOIN ");
        w.push_str(self.table);
        if self.alias != self.table {
            w.push_str(" ");
            w.push_str(self.alias);
        }
        if self.spec.kind != JoinType::Cross {
            w.push_str(" ON ");
            w.push_str(&self.spec.on);
        }
    }
}

/// Plans the joins of one primary table.
#[derive(Debug, Clone, Copy)]
pub struct JoinPlanner<'a> {
    schema: &'a Schema,
    table: &'a str,
}

impl<'a> JoinPlanner<'a> {
    /// Creates a planner for joins declared by `table`.
    #[must_use]
    pub const fn new(schema: &'a Schema, table: &'a str) -> Self {
        Self { schema, table }
    }

    /// Returns the alias `relation` is joined as, or `None` if the primary
    /// table declares no join to it.
    ///
    /// The join's own alias takes precedence over the joined table's schema
    /// alias, which takes precedence over its name.
    #[must_use]
    pub fn join_alias(&self, relation: &str) -> Option<&'a str> {
        let (name, spec) = self
            .schema
            .get(self.table)?
            .joins
            .get_key_value(relation)?;
        Some(self.alias_for(name, spec))
    }

    fn alias_for(&self, name: &'a str, spec: &'a JoinSpec) -> &'a str {
        spec.alias
            .as_deref()
            .unwrap_or_else(|| self.schema.qualifier(name))
    }

    /// Selects the joins required by `references` and `expanded`.
    ///
    /// `references` are rendered column references (`r.label`); bare names
    /// never require a join. `expanded` lists relations named in `$expand`.
    #[must_use]
    pub fn plan<'r, I>(&self, references: I, expanded: &[&str]) -> Vec<PlannedJoin<'a>>
    where
        I: IntoIterator<Item = &'r str>,
    {
        let Some(primary) = self.schema.get(self.table) else {
            return Vec::new();
        };

        let qualifiers: HashSet<&str> = references.into_iter().filter_map(qualifier_of).collect();

        primary
            .joins
            .iter()
            .filter_map(|(name, spec)| {
                let alias = self.alias_for(name, spec);
                let required = expanded.contains(&name.as_str()) || qualifiers.contains(alias);
                if required {
                    trace!(table = %name, alias, "join required");
                }
                required.then_some(PlannedJoin {
                    table: name,
                    alias,
                    spec,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MySqlDialect;
    use crate::schema::TableSchema;

    fn schema() -> Schema {
        Schema::new()
            .table(
                "users",
                TableSchema::new(["id", "name", "role_id", "team_id"])
                    .alias("u")
                    .join("roles", JoinSpec::left("u.role_id = r.id").alias("r"))
                    .join("teams", JoinSpec::inner("u.team_id = teams.id")),
            )
            .table("roles", TableSchema::new(["label"]).alias("r"))
            .table("teams", TableSchema::new(["title"]))
    }

    fn render(join: &PlannedJoin<'_>) -> String {
        let mut w = SqlWriter::new(&MySqlDialect);
        join.write_sql(&mut w);
        w.finish().0
    }

    #[test]
    fn test_unreferenced_join_is_omitted() {
        let schema = schema();
        let planner = JoinPlanner::new(&schema, "users");
        assert!(planner.plan(["u.name", "u.id"], &[]).is_empty());
    }

    #[test]
    fn test_referenced_join_is_planned_once() {
        let schema = schema();
        let planner = JoinPlanner::new(&schema, "users");
        let joins = planner.plan(["r.label", "u.name", "r.label"], &[]);
        assert_eq!(joins.len(), 1);
        assert_eq!(render(&joins[0]), "LEFT JOIN roles r ON u.role_id = r.id");
    }

    #[test]
    fn test_expanded_join_is_planned_without_references() {
        let schema = schema();
        let planner = JoinPlanner::new(&schema, "users");
        let joins = planner.plan(std::iter::empty(), &["teams"]);
        assert_eq!(joins.len(), 1);
        assert_eq!(render(&joins[0]), "INNER JOIN teams ON u.team_id = teams.id");
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let schema = schema();
        let planner = JoinPlanner::new(&schema, "users");
        let joins = planner.plan(["teams.title", "r.label"], &[]);
        let tables: Vec<&str> = joins.iter().map(|j| j.table).collect();
        assert_eq!(tables, vec!["roles", "teams"]);
    }

    #[test]
    fn test_join_alias() {
        let schema = schema();
        let planner = JoinPlanner::new(&schema, "users");
        assert_eq!(planner.join_alias("roles"), Some("r"));
        assert_eq!(planner.join_alias("teams"), Some("teams"));
        assert_eq!(planner.join_alias("orders"), None);
        assert_eq!(JoinPlanner::new(&schema, "missing").join_alias("roles"), None);
    }

    #[test]
    fn test_join_is_keyed_by_join_alias() {
        let schema = Schema::new()
            .table(
                "users",
                TableSchema::new(["role_id"])
                    .alias("u")
                    .join("roles", JoinSpec::left("u.role_id = ro.id").alias("ro")),
            )
            .table("roles", TableSchema::new(["label"]).alias("r"));
        let planner = JoinPlanner::new(&schema, "users");
        assert!(planner.plan(["r.label"], &[]).is_empty());
        let joins = planner.plan(["ro.label"], &[]);
        assert_eq!(render(&joins[0]), "LEFT JOIN roles ro ON u.role_id = ro.id");
    }

    #[test]
    fn test_cross_join_has_no_predicate() {
        let schema = Schema::new().table(
            "a",
            TableSchema::new(["x"]).join("b", JoinSpec::new(JoinType::Cross, "")),
        );
        let planner = JoinPlanner::new(&schema, "a");
        let joins = planner.plan(std::iter::empty(), &["b"]);
        assert_eq!(render(&joins[0]), "CROSS JOIN b");
    }
}

//! `$expand` parsing.
//!
//! `$expand=roles($select=label,id),tags` requests the `roles` and `tags`
//! joins, projecting `label` and `id` from `roles` and nothing extra from
//! `tags`.

use crate::error::{CompileError, Result};
use crate::resolver::check_identifier;

/// One expanded relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Joined table name, as declared in the primary table's joins.
    pub table: String,
    /// Columns to project from the joined table. May be empty.
    pub selects: Vec<String>,
}

/// Parses an `$expand` value.
///
/// # Errors
///
/// Returns `CompileError::InvalidExpand` on unbalanced parentheses, empty
/// entries or unsupported nested options, and
/// `CompileError::InvalidIdentifier` on malformed names.
pub fn parse_expand(input: &str) -> Result<Vec<Expansion>> {
    split_top_level(input)?
        .into_iter()
        .map(parse_item)
        .collect()
}

/// Splits on commas that are not inside parentheses.
fn split_top_level(input: &str) -> Result<Vec<&str>> {
    let mut items = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    CompileError::InvalidExpand(format!("unbalanced ')' in '{input}'"))
                })?;
            }
            ',' if depth == 0 => {
                items.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(CompileError::InvalidExpand(format!(
            "missing ')' in '{input}'"
        )));
    }
    items.push(&input[start..]);
    Ok(items)
}

fn parse_item(item: &str) -> Result<Expansion> {
    let item = item.trim();
    if item.is_empty() {
        return Err(CompileError::InvalidExpand(String::from("empty entry")));
    }

    let Some((table, rest)) = item.split_once('(') else {
        check_identifier(item, "$expand")?;
        return Ok(Expansion {
            table: String::from(item),
            selects: Vec::new(),
        });
    };

    let table = table.trim();
    check_identifier(table, "$expand")?;
    let options = rest
        .strip_suffix(')')
        .ok_or_else(|| CompileError::InvalidExpand(format!("trailing input after '{item}'")))?;

    let mut selects = Vec::new();
    for option in options.split(';').map(str::trim).filter(|o| !o.is_empty()) {
        let Some(fields) = option.strip_prefix("$select=") else {
            return Err(CompileError::InvalidExpand(format!(
                "unsupported option '{option}' for '{table}'"
            )));
        };
        for field in fields.split(',').map(str::trim) {
            check_identifier(field, "$expand")?;
            selects.push(String::from(field));
        }
    }

    Ok(Expansion {
        table: String::from(table),
        selects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_nested_select() {
        let expansions = parse_expand("roles($select=label,id),tags").unwrap();
        assert_eq!(
            expansions,
            vec![
                Expansion {
                    table: String::from("roles"),
                    selects: vec![String::from("label"), String::from("id")],
                },
                Expansion {
                    table: String::from("tags"),
                    selects: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_whitespace_is_ignored() {
        let expansions = parse_expand(" roles ( $select= label ) ").unwrap();
        assert_eq!(expansions[0].table, "roles");
        assert_eq!(expansions[0].selects, vec![String::from("label")]);
    }

    #[test]
    fn test_empty_parentheses() {
        let expansions = parse_expand("roles()").unwrap();
        assert!(expansions[0].selects.is_empty());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(matches!(
            parse_expand("roles($select=label"),
            Err(CompileError::InvalidExpand(_))
        ));
        assert!(matches!(
            parse_expand("roles)"),
            Err(CompileError::InvalidExpand(_))
        ));
    }

    #[test]
    fn test_unsupported_option() {
        assert!(matches!(
            parse_expand("roles($filter=id eq 1)"),
            Err(CompileError::InvalidExpand(_))
        ));
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(
            parse_expand("roles;drop"),
            Err(CompileError::InvalidIdentifier { .. })
        ));
        assert!(parse_expand("roles,").is_err());
    }
}

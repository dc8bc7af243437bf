//! Column-shape steps: rename, drop, copy, swap, merge, columns, flatten.

use crate::error::StepError;
use crate::row::{Row, Value};

use super::{StepOutcome, require};

pub(super) fn rename(mut row: Row, old: &str, new: &str) -> Result<StepOutcome, StepError> {
    let pos = require(&row, old)?;
    row.set_name(pos, new);
    Ok(StepOutcome::Keep(row))
}

/// Dropping an absent column is a no-op; the row passes through.
pub(super) fn drop_column(mut row: Row, column: &str) -> Result<StepOutcome, StepError> {
    if let Some(pos) = row.find(column) {
        row.remove(pos);
    }
    Ok(StepOutcome::Keep(row))
}

pub(super) fn copy(
    mut row: Row,
    src: &str,
    dest: &str,
    force: bool,
) -> Result<StepOutcome, StepError> {
    let src_pos = require(&row, src)?;
    let value = row.value(src_pos).clone();
    match row.find(dest) {
        Some(pos) if force => row.set_value(pos, value),
        Some(_) => return Err(StepError::ColumnExists(dest.to_string())),
        None => row.add(dest, value),
    }
    Ok(StepOutcome::Keep(row))
}

pub(super) fn swap(mut row: Row, a: &str, b: &str) -> Result<StepOutcome, StepError> {
    let pos_a = require(&row, a)?;
    let pos_b = require(&row, b)?;
    row.swap_values(pos_a, pos_b);
    Ok(StepOutcome::Keep(row))
}

pub(super) fn merge(
    mut row: Row,
    a: &str,
    b: &str,
    dest: &str,
    separator: &str,
) -> Result<StepOutcome, StepError> {
    let pos_a = require(&row, a)?;
    let pos_b = require(&row, b)?;
    let merged = format!(
        "{}{separator}{}",
        row.value(pos_a).to_text(),
        row.value(pos_b).to_text()
    );
    row.add(dest, merged);
    Ok(StepOutcome::Keep(row))
}

/// Replace every column name in order. The name count must equal the
/// row width.
pub(super) fn columns(mut row: Row, names: &[String]) -> Result<StepOutcome, StepError> {
    if names.len() != row.len() {
        return Err(StepError::WidthMismatch {
            expected: names.len(),
            found: row.len(),
        });
    }
    for (pos, name) in names.iter().enumerate() {
        row.set_name(pos, name);
    }
    Ok(StepOutcome::Keep(row))
}

/// Fan a row out over one or more list-valued columns. Shorter lists
/// pad with null; a null value counts as an empty list.
pub(super) fn flatten(row: Row, columns: &[String]) -> Result<StepOutcome, StepError> {
    let mut lists: Vec<(usize, Vec<Value>)> = Vec::with_capacity(columns.len());
    for column in columns {
        let pos = require(&row, column)?;
        let items = match row.value(pos) {
            Value::List(items) => items.clone(),
            Value::JsonArray(items) => items.iter().cloned().map(Value::from_json).collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(StepError::TypeMismatch {
                    column: column.clone(),
                    expected: "a list",
                    found: other.type_name(),
                });
            }
        };
        lists.push((pos, items));
    }

    let longest = lists.iter().map(|(_, items)| items.len()).max().unwrap_or(0);
    let mut out = Vec::with_capacity(longest);
    for i in 0..longest {
        let mut copy = row.clone();
        for (pos, items) in &lists {
            copy.set_value(*pos, items.get(i).cloned().unwrap_or(Value::Null));
        }
        out.push(copy);
    }
    Ok(StepOutcome::Many(out))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::from_pairs([("a", Value::from(1i64)), ("b", Value::from("s"))])
    }

    #[test]
    fn rename_preserves_position_and_width() {
        let out = match rename(row(), "a", "z").unwrap() {
            StepOutcome::Keep(r) => r,
            _ => unreachable!(),
        };
        assert_eq!(out.len(), 2);
        assert_eq!(out.name(0), "z");
        assert_eq!(out.value(0), &Value::Int(1));
    }

    #[test]
    fn rename_missing_column_fails() {
        assert!(matches!(
            rename(row(), "nope", "z"),
            Err(StepError::MissingColumn(c)) if c == "nope"
        ));
    }

    #[test]
    fn copy_refuses_existing_dest_without_force() {
        assert!(matches!(
            copy(row(), "a", "b", false),
            Err(StepError::ColumnExists(c)) if c == "b"
        ));
        let out = match copy(row(), "a", "b", true).unwrap() {
            StepOutcome::Keep(r) => r,
            _ => unreachable!(),
        };
        assert_eq!(out.value_of("b"), Some(&Value::Int(1)));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn swap_twice_is_identity() {
        let original = row();
        let once = match swap(original.clone(), "a", "b").unwrap() {
            StepOutcome::Keep(r) => r,
            _ => unreachable!(),
        };
        let twice = match swap(once, "a", "b").unwrap() {
            StepOutcome::Keep(r) => r,
            _ => unreachable!(),
        };
        assert_eq!(twice, original);
    }

    #[test]
    fn merge_concatenates_stringified_values() {
        let out = match merge(row(), "a", "b", "ab", "-").unwrap() {
            StepOutcome::Keep(r) => r,
            _ => unreachable!(),
        };
        assert_eq!(out.value_of("ab"), Some(&Value::from("1-s")));
    }

    #[test]
    fn columns_requires_matching_width() {
        assert!(matches!(
            columns(row(), &["x".into()]),
            Err(StepError::WidthMismatch {
                expected: 1,
                found: 2
            })
        ));
        let out = match columns(row(), &["x".into(), "y".into()]).unwrap() {
            StepOutcome::Keep(r) => r,
            _ => unreachable!(),
        };
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn flatten_pads_shorter_lists_with_null() {
        let mut row = Row::new();
        row.add(
            "xs",
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        );
        row.add("ys", Value::List(vec![Value::from("only")]));
        let rows = match flatten(row, &["xs".into(), "ys".into()]).unwrap() {
            StepOutcome::Many(rows) => rows,
            _ => unreachable!(),
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].value_of("ys"), Some(&Value::from("only")));
        assert_eq!(rows[2].value_of("xs"), Some(&Value::Int(3)));
        assert_eq!(rows[2].value_of("ys"), Some(&Value::Null));
    }
}

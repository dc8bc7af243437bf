//! Fan-out steps: one row in, several rows or columns out.

use crate::context::ExecutionContext;
use crate::error::StepError;
use crate::row::{Row, Value};

use super::{StepOutcome, require};

/// Split the column on a regex and emit one row per piece, each a
/// shallow copy with the column replaced by its piece. Piece order is
/// emission order.
pub(super) fn split_to_rows(
    row: Row,
    column: &str,
    pattern: &str,
    ctx: &mut ExecutionContext,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = row.value(pos).to_text();
    let pieces: Vec<String> = ctx
        .regex(pattern)?
        .split(&text)
        .map(ToString::to_string)
        .collect();

    let rows = pieces
        .into_iter()
        .map(|piece| {
            let mut copy = row.clone();
            copy.set_value(pos, Value::String(piece));
            copy
        })
        .collect();
    Ok(StepOutcome::Many(rows))
}

/// Split the column on a regex and append one `<column>_<i>` column
/// per piece, leaving the source column in place.
pub(super) fn split_to_columns(
    mut row: Row,
    column: &str,
    pattern: &str,
    ctx: &mut ExecutionContext,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = row.value(pos).to_text();
    let pieces: Vec<String> = ctx
        .regex(pattern)?
        .split(&text)
        .map(ToString::to_string)
        .collect();

    for (i, piece) in pieces.into_iter().enumerate() {
        row.add(format!("{column}_{}", i + 1), Value::String(piece));
    }
    Ok(StepOutcome::Keep(row))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn split_to_rows_emits_one_row_per_piece() {
        let row = Row::from_pairs([("id", Value::from(7i64)), ("tags", Value::from("a,b,c"))]);
        let mut ctx = ExecutionContext::new();
        let rows = match split_to_rows(row, "tags", ",", &mut ctx).unwrap() {
            StepOutcome::Many(rows) => rows,
            _ => unreachable!(),
        };
        assert_eq!(rows.len(), 3);
        let tags: Vec<_> = rows.iter().map(|r| r.value_of("tags").unwrap()).collect();
        assert_eq!(
            tags,
            vec![&Value::from("a"), &Value::from("b"), &Value::from("c")]
        );
        assert!(rows.iter().all(|r| r.value_of("id") == Some(&Value::Int(7))));
    }

    #[test]
    fn split_to_columns_appends_numbered_columns() {
        let row = Row::from_pairs([("csv", "x;y")]);
        let mut ctx = ExecutionContext::new();
        let out = match split_to_columns(row, "csv", ";", &mut ctx).unwrap() {
            StepOutcome::Keep(row) => row,
            _ => unreachable!(),
        };
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["csv", "csv_1", "csv_2"]);
        assert_eq!(out.value_of("csv_2"), Some(&Value::from("y")));
    }

    #[test]
    fn missing_column_is_an_error() {
        let row = Row::new();
        let mut ctx = ExecutionContext::new();
        assert!(matches!(
            split_to_rows(row, "nope", ",", &mut ctx),
            Err(StepError::MissingColumn(_))
        ));
    }
}

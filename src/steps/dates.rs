//! Date reformatting steps. Patterns are chrono `strftime` patterns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::StepError;
use crate::row::{Row, Value};

use super::{StepOutcome, require};

/// Reparse the column under `src_pattern` and replace it with the
/// `dst_pattern` rendering. Offset-aware datetimes, naive datetimes,
/// and bare dates (midnight) are tried in that order.
pub(super) fn format_date(
    mut row: Row,
    column: &str,
    src_pattern: &str,
    dst_pattern: &str,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = match row.value(pos) {
        Value::String(s) => s.clone(),
        other => {
            return Err(StepError::TypeMismatch {
                column: column.to_string(),
                expected: "a string",
                found: other.type_name(),
            });
        }
    };

    let formatted = if let Ok(dt) = DateTime::parse_from_str(&text, src_pattern) {
        render(&dt.format(dst_pattern), column, dst_pattern)?
    } else if let Ok(ndt) = NaiveDateTime::parse_from_str(&text, src_pattern) {
        render(&ndt.format(dst_pattern), column, dst_pattern)?
    } else if let Ok(date) = NaiveDate::parse_from_str(&text, src_pattern) {
        let midnight = date.and_time(NaiveTime::MIN);
        render(&midnight.format(dst_pattern), column, dst_pattern)?
    } else {
        return Err(StepError::Malformed {
            column: column.to_string(),
            message: format!("'{text}' does not match date pattern '{src_pattern}'"),
        });
    };

    row.set_value(pos, Value::String(formatted));
    Ok(StepOutcome::Keep(row))
}

/// Interpret the column as Unix epoch seconds and replace it with the
/// UTC rendering under `pattern`.
pub(super) fn format_unix_timestamp(
    mut row: Row,
    column: &str,
    pattern: &str,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let seconds = row.value(pos).as_i64().ok_or_else(|| StepError::TypeMismatch {
        column: column.to_string(),
        expected: "epoch seconds",
        found: row.value(pos).type_name(),
    })?;
    let timestamp = DateTime::from_timestamp(seconds, 0).ok_or_else(|| StepError::Malformed {
        column: column.to_string(),
        message: format!("{seconds} is out of range for a timestamp"),
    })?;
    let formatted = render(&timestamp.format(pattern), column, pattern)?;
    row.set_value(pos, Value::String(formatted));
    Ok(StepOutcome::Keep(row))
}

/// Render a chrono `DelayedFormat` fallibly: an invalid destination
/// pattern surfaces as a step error instead of a formatting panic.
fn render(
    formatted: &impl std::fmt::Display,
    column: &str,
    pattern: &str,
) -> Result<String, StepError> {
    use std::fmt::Write as _;
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|_| StepError::Malformed {
        column: column.to_string(),
        message: format!("cannot render with date pattern '{pattern}'"),
    })?;
    Ok(out)
}

//! Case, slice, and cut steps over string-ish columns.

use crate::error::StepError;
use crate::row::{Row, Value};

use super::{StepOutcome, require};

/// How a case step transforms the column text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseKind {
    Upper,
    Lower,
    Title,
}

/// One piece of a `character-cut` range spec, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutRange {
    Single(usize),
    Closed(usize, usize),
    From(usize),
    To(usize),
}

impl CutRange {
    /// Parse a comma-separated `cut -c` range list (`1-3,5,7-,-2`).
    /// The error carries the offending piece.
    pub fn parse_list(spec: &str) -> Result<Vec<Self>, String> {
        spec.split(',')
            .map(str::trim)
            .map(|piece| Self::parse_piece(piece).ok_or_else(|| piece.to_string()))
            .collect()
    }

    fn parse_piece(piece: &str) -> Option<Self> {
        if let Some(rest) = piece.strip_prefix('-') {
            let to: usize = rest.parse().ok()?;
            return (to > 0).then_some(Self::To(to));
        }
        if let Some((lo, hi)) = piece.split_once('-') {
            let lo: usize = lo.parse().ok()?;
            if lo == 0 {
                return None;
            }
            if hi.is_empty() {
                return Some(Self::From(lo));
            }
            let hi: usize = hi.parse().ok()?;
            return (hi >= lo).then_some(Self::Closed(lo, hi));
        }
        let single: usize = piece.parse().ok()?;
        (single > 0).then_some(Self::Single(single))
    }
}

/// Case steps require a string column; other value types are rejected.
pub(super) fn change_case(
    mut row: Row,
    column: &str,
    kind: CaseKind,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = match row.value(pos) {
        Value::String(s) => s,
        other => {
            return Err(StepError::TypeMismatch {
                column: column.to_string(),
                expected: "a string",
                found: other.type_name(),
            });
        }
    };
    let changed = match kind {
        CaseKind::Upper => text.to_uppercase(),
        CaseKind::Lower => text.to_lowercase(),
        CaseKind::Title => title_case(text),
    };
    row.set_value(pos, Value::String(changed));
    Ok(StepOutcome::Keep(row))
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            word_start = true;
            out.push(c);
        } else if word_start {
            out.extend(c.to_uppercase());
            word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Substring `[start, end)` of the stringified source, clamped to the
/// value's bounds, written to `dest`.
pub(super) fn index_split(
    mut row: Row,
    src: &str,
    start: i64,
    end: i64,
    dest: &str,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, src)?;
    let chars: Vec<char> = row.value(pos).to_text().chars().collect();
    let len = chars.len();
    let from = usize::try_from(start.max(0)).unwrap_or(0).min(len);
    let to = usize::try_from(end.max(0)).unwrap_or(0).clamp(from, len);
    let piece: String = chars[from..to].iter().collect();
    row.set_or_add(dest, Value::String(piece));
    Ok(StepOutcome::Keep(row))
}

/// Split on the first occurrence of the delimiter: the head goes to
/// `first`, everything after it to `second`. No delimiter → the whole
/// value in `first` and null in `second`.
pub(super) fn split(
    mut row: Row,
    src: &str,
    delimiter: char,
    first: &str,
    second: &str,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, src)?;
    let text = row.value(pos).to_text();
    match text.split_once(delimiter) {
        Some((head, tail)) => {
            row.add(first, Value::String(head.to_string()));
            row.add(second, Value::String(tail.to_string()));
        }
        None => {
            row.add(first, Value::String(text));
            row.add(second, Value::Null);
        }
    }
    Ok(StepOutcome::Keep(row))
}

/// `cut -c`-style character selection: collect the characters named by
/// the ranges, in range order, positions past the end ignored.
pub(super) fn character_cut(
    mut row: Row,
    src: &str,
    dest: &str,
    ranges: &[CutRange],
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, src)?;
    let chars: Vec<char> = row.value(pos).to_text().chars().collect();
    let len = chars.len();
    let mut out = String::new();
    for range in ranges {
        let (lo, hi) = match *range {
            CutRange::Single(p) => (p, p),
            CutRange::Closed(lo, hi) => (lo, hi),
            CutRange::From(lo) => (lo, len),
            CutRange::To(hi) => (1, hi),
        };
        for p in lo..=hi.min(len) {
            out.push(chars[p - 1]);
        }
    }
    row.set_or_add(dest, Value::String(out));
    Ok(StepOutcome::Keep(row))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keep(outcome: Result<StepOutcome, StepError>) -> Row {
        match outcome.unwrap() {
            StepOutcome::Keep(row) => row,
            _ => unreachable!(),
        }
    }

    #[test]
    fn case_steps_transform_string_columns() {
        let row = Row::from_pairs([("c", "hello WORLD")]);
        assert_eq!(
            keep(change_case(row.clone(), "c", CaseKind::Upper)).value_of("c"),
            Some(&Value::from("HELLO WORLD"))
        );
        assert_eq!(
            keep(change_case(row.clone(), "c", CaseKind::Lower)).value_of("c"),
            Some(&Value::from("hello world"))
        );
        assert_eq!(
            keep(change_case(row, "c", CaseKind::Title)).value_of("c"),
            Some(&Value::from("Hello World"))
        );
    }

    #[test]
    fn case_step_rejects_non_string() {
        let row = Row::from_pairs([("c", 5i64)]);
        assert!(matches!(
            change_case(row, "c", CaseKind::Upper),
            Err(StepError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn index_split_extracts_clamped_range() {
        let row = Row::from_pairs([("s", "abcdef")]);
        let out = keep(index_split(row, "s", 1, 4, "d"));
        assert_eq!(out.value_of("s"), Some(&Value::from("abcdef")));
        assert_eq!(out.value_of("d"), Some(&Value::from("bcd")));
    }

    #[test]
    fn index_split_clamps_out_of_bounds() {
        let row = Row::from_pairs([("s", "ab")]);
        let out = keep(index_split(row, "s", 1, 99, "d"));
        assert_eq!(out.value_of("d"), Some(&Value::from("b")));
        let row = Row::from_pairs([("s", "ab")]);
        let out = keep(index_split(row, "s", -3, 1, "d"));
        assert_eq!(out.value_of("d"), Some(&Value::from("a")));
    }

    #[test]
    fn split_on_first_occurrence() {
        let row = Row::from_pairs([("kv", "key=a=b")]);
        let out = keep(split(row, "kv", '=', "k", "v"));
        assert_eq!(out.value_of("k"), Some(&Value::from("key")));
        assert_eq!(out.value_of("v"), Some(&Value::from("a=b")));
    }

    #[test]
    fn split_without_delimiter_yields_null_second() {
        let row = Row::from_pairs([("kv", "solo")]);
        let out = keep(split(row, "kv", '=', "k", "v"));
        assert_eq!(out.value_of("k"), Some(&Value::from("solo")));
        assert_eq!(out.value_of("v"), Some(&Value::Null));
    }

    #[test]
    fn cut_ranges_parse_and_select() {
        let ranges = CutRange::parse_list("1-2,5,8-").unwrap();
        let row = Row::from_pairs([("s", "abcdefghij")]);
        let out = keep(character_cut(row, "s", "d", &ranges));
        assert_eq!(out.value_of("d"), Some(&Value::from("abehij")));
    }

    #[test]
    fn cut_range_rejects_garbage() {
        assert_eq!(CutRange::parse_list("1-x"), Err("1-x".to_string()));
        assert_eq!(CutRange::parse_list("0"), Err("0".to_string()));
    }
}

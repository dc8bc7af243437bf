//! Expression and filter steps: `set column`, row filters, sed,
//! quantize, fill-null-or-empty.

use evalexpr::{
    ContextWithMutableVariables, DefaultNumericTypes, HashMapContext, Value as ExprValue,
};

use crate::context::ExecutionContext;
use crate::error::StepError;
use crate::row::{Row, Value};

use super::{StepOutcome, require};

/// A validated `sed` substitution (`s<delim>pattern<delim>replacement<delim>flags`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SedExpr {
    pub pattern: String,
    pub replacement: String,
    pub global: bool,
    pub insensitive: bool,
}

impl SedExpr {
    /// Parse and validate a substitution expression. The error is a
    /// human-readable reason; the caller attaches directive context.
    pub fn parse(expr: &str) -> Result<Self, String> {
        let mut chars = expr.chars();
        if chars.next() != Some('s') {
            return Err("expected a substitution of the form s/pattern/replacement/".to_string());
        }
        let Some(delim) = chars.next() else {
            return Err("missing delimiter after 's'".to_string());
        };
        let body: String = chars.collect();
        let parts: Vec<&str> = body.split(delim).collect();
        if parts.len() < 3 {
            return Err(format!("expected three '{delim}' delimiters"));
        }
        if parts.len() > 3 {
            return Err(format!("too many '{delim}' delimiters"));
        }
        let mut global = false;
        let mut insensitive = false;
        for flag in parts[2].chars() {
            match flag {
                'g' => global = true,
                'i' => insensitive = true,
                other => return Err(format!("unsupported flag '{other}'")),
            }
        }
        Ok(Self {
            pattern: parts[0].to_string(),
            replacement: parts[1].to_string(),
            global,
            insensitive,
        })
    }
}

/// One `lo:hi=label` bucket of a quantize range spec; `lo` inclusive,
/// `hi` exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeRange {
    pub low: f64,
    pub high: f64,
    pub label: String,
}

impl QuantizeRange {
    /// Parse a comma-separated `lo:hi=label` list. The error carries
    /// the offending piece.
    pub fn parse_list(spec: &str) -> Result<Vec<Self>, String> {
        spec.split(',')
            .map(str::trim)
            .map(|piece| Self::parse_piece(piece).ok_or_else(|| piece.to_string()))
            .collect()
    }

    fn parse_piece(piece: &str) -> Option<Self> {
        let (bounds, label) = piece.split_once('=')?;
        let (lo, hi) = bounds.split_once(':')?;
        let low: f64 = lo.trim().parse().ok()?;
        let high: f64 = hi.trim().parse().ok()?;
        (!label.is_empty()).then(|| Self {
            low,
            high,
            label: label.to_string(),
        })
    }
}

/// Evaluate an expression over the row and write the result to the
/// column, creating it if absent.
pub(super) fn set_column(
    mut row: Row,
    column: &str,
    expression: &str,
    ctx: &mut ExecutionContext,
) -> Result<StepOutcome, StepError> {
    let result = evaluate(&row, expression, ctx)?;
    let value = match result {
        ExprValue::String(s) => Value::String(s),
        ExprValue::Int(i) => Value::Int(i),
        ExprValue::Float(f) => Value::Float(f),
        ExprValue::Boolean(b) => Value::Bool(b),
        ExprValue::Empty => Value::Null,
        ExprValue::Tuple(_) => {
            return Err(StepError::Expression {
                expression: expression.to_string(),
                message: "tuple results are not supported".to_string(),
            });
        }
    };
    row.set_or_add(column, value);
    Ok(StepOutcome::Keep(row))
}

/// SKIP the row when the expression evaluates truthy (a boolean, or a
/// non-zero integer).
pub(super) fn filter_row_if_true(
    row: Row,
    expression: &str,
    ctx: &mut ExecutionContext,
) -> Result<StepOutcome, StepError> {
    let truthy = match evaluate(&row, expression, ctx)? {
        ExprValue::Boolean(b) => b,
        ExprValue::Int(i) => i != 0,
        other => {
            return Err(StepError::Expression {
                expression: expression.to_string(),
                message: format!("condition evaluated to non-boolean {other:?}"),
            });
        }
    };
    if truthy {
        Ok(StepOutcome::Skip)
    } else {
        Ok(StepOutcome::Keep(row))
    }
}

/// SKIP the row when the column's stringified value matches the regex.
pub(super) fn filter_row_if_matched(
    row: Row,
    column: &str,
    pattern: &str,
    ctx: &mut ExecutionContext,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = row.value(pos).to_text();
    if ctx.regex(pattern)?.is_match(&text) {
        Ok(StepOutcome::Skip)
    } else {
        Ok(StepOutcome::Keep(row))
    }
}

/// Apply a sed substitution to the column's stringified value.
pub(super) fn sed(
    mut row: Row,
    column: &str,
    expr: &SedExpr,
    ctx: &mut ExecutionContext,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = row.value(pos).to_text();
    let pattern = if expr.insensitive {
        format!("(?i){}", expr.pattern)
    } else {
        expr.pattern.clone()
    };
    let re = ctx.regex(&pattern)?;
    let replaced = if expr.global {
        re.replace_all(&text, expr.replacement.as_str())
    } else {
        re.replace(&text, expr.replacement.as_str())
    };
    row.set_value(pos, Value::String(replaced.into_owned()));
    Ok(StepOutcome::Keep(row))
}

/// Map a numeric source into the first bucket with `lo <= v < hi`,
/// writing the bucket label (or null) to `dest`.
pub(super) fn quantize(
    mut row: Row,
    src: &str,
    dest: &str,
    ranges: &[QuantizeRange],
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, src)?;
    let v = row.value(pos).as_f64().ok_or_else(|| StepError::TypeMismatch {
        column: src.to_string(),
        expected: "a number",
        found: row.value(pos).type_name(),
    })?;
    let label = ranges
        .iter()
        .find(|r| r.low <= v && v < r.high)
        .map_or(Value::Null, |r| Value::String(r.label.clone()));
    row.set_or_add(dest, label);
    Ok(StepOutcome::Keep(row))
}

/// Replace a null or empty value with the fixed literal. A missing
/// column counts as null and is appended.
pub(super) fn fill_null_or_empty(
    mut row: Row,
    column: &str,
    fixed: &str,
) -> Result<StepOutcome, StepError> {
    match row.find(column) {
        None => row.add(column, fixed),
        Some(pos) => {
            let empty = match row.value(pos) {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                _ => false,
            };
            if empty {
                row.set_value(pos, Value::String(fixed.to_string()));
            }
        }
    }
    Ok(StepOutcome::Keep(row))
}

/// Evaluate the (cached) expression with the row's identifier-named
/// scalar columns bound as variables.
fn evaluate(
    row: &Row,
    expression: &str,
    ctx: &mut ExecutionContext,
) -> Result<ExprValue<DefaultNumericTypes>, StepError> {
    let mut bindings: HashMapContext<DefaultNumericTypes> = HashMapContext::new();
    for (name, value) in row.columns() {
        if !is_identifier(name) {
            continue;
        }
        let bound = match value {
            Value::Int(i) => ExprValue::Int(*i),
            Value::Float(f) => ExprValue::Float(*f),
            Value::Bool(b) => ExprValue::Boolean(*b),
            Value::String(s) => ExprValue::String(s.clone()),
            _ => continue,
        };
        bindings
            .set_value(name.to_string(), bound)
            .map_err(|e| StepError::Expression {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;
    }

    let node = ctx.expression(expression)?;
    node.eval_with_context(&bindings)
        .map_err(|e| StepError::Expression {
            expression: expression.to_string(),
            message: e.to_string(),
        })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
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
    fn sed_expr_parses_flags() {
        let expr = SedExpr::parse("s/a+/b/gi").unwrap();
        assert!(expr.global && expr.insensitive);
        assert_eq!(expr.pattern, "a+");
        assert_eq!(expr.replacement, "b");
    }

    #[test]
    fn sed_expr_rejects_bad_shapes() {
        assert!(SedExpr::parse("y/a/b/").is_err());
        assert!(SedExpr::parse("s/a/b").is_err());
        assert!(SedExpr::parse("s/a/b/q").is_err());
    }

    #[test]
    fn sed_replaces_first_or_all() {
        let mut ctx = ExecutionContext::new();
        let expr = SedExpr::parse("s/o/0/").unwrap();
        let out = keep(sed(Row::from_pairs([("c", "foo")]), "c", &expr, &mut ctx));
        assert_eq!(out.value_of("c"), Some(&Value::from("f0o")));

        let expr = SedExpr::parse("s/o/0/g").unwrap();
        let out = keep(sed(Row::from_pairs([("c", "foo")]), "c", &expr, &mut ctx));
        assert_eq!(out.value_of("c"), Some(&Value::from("f00")));
    }

    #[test]
    fn set_column_evaluates_over_row_variables() {
        let mut ctx = ExecutionContext::new();
        let row = Row::from_pairs([("a", 2i64), ("b", 3i64)]);
        let out = keep(set_column(row, "total", "a + b * 2", &mut ctx));
        assert_eq!(out.value_of("total"), Some(&Value::Int(8)));
    }

    #[test]
    fn set_column_replaces_existing_column() {
        let mut ctx = ExecutionContext::new();
        let row = Row::from_pairs([("a", 2i64)]);
        let out = keep(set_column(row, "a", "a * 10", &mut ctx));
        assert_eq!(out.value_of("a"), Some(&Value::Int(20)));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn filter_row_if_true_skips_on_truthy() {
        let mut ctx = ExecutionContext::new();
        let row = Row::from_pairs([("n", 5i64)]);
        assert!(matches!(
            filter_row_if_true(row.clone(), "n > 3", &mut ctx).unwrap(),
            StepOutcome::Skip
        ));
        assert!(matches!(
            filter_row_if_true(row, "n > 9", &mut ctx).unwrap(),
            StepOutcome::Keep(_)
        ));
    }

    #[test]
    fn bad_expression_is_a_step_error() {
        let mut ctx = ExecutionContext::new();
        let row = Row::from_pairs([("n", 1i64)]);
        assert!(matches!(
            filter_row_if_true(row, "n +* 2", &mut ctx),
            Err(StepError::Expression { .. })
        ));
    }

    #[test]
    fn quantize_buckets_are_half_open() {
        let ranges = QuantizeRange::parse_list("0:10=low,10:20=high").unwrap();
        let out = keep(quantize(Row::from_pairs([("n", 10i64)]), "n", "band", &ranges));
        assert_eq!(out.value_of("band"), Some(&Value::from("high")));

        let out = keep(quantize(Row::from_pairs([("n", 99i64)]), "n", "band", &ranges));
        assert_eq!(out.value_of("band"), Some(&Value::Null));
    }

    #[test]
    fn quantize_range_rejects_garbage() {
        assert_eq!(
            QuantizeRange::parse_list("0:ten=low"),
            Err("0:ten=low".to_string())
        );
    }

    #[test]
    fn fill_null_or_empty_fills_and_appends() {
        let out = keep(fill_null_or_empty(
            Row::from_pairs([("c", Value::Null)]),
            "c",
            "n/a",
        ));
        assert_eq!(out.value_of("c"), Some(&Value::from("n/a")));

        let out = keep(fill_null_or_empty(Row::from_pairs([("c", "set")]), "c", "n/a"));
        assert_eq!(out.value_of("c"), Some(&Value::from("set")));

        let out = keep(fill_null_or_empty(Row::new(), "c", "n/a"));
        assert_eq!(out.value_of("c"), Some(&Value::from("n/a")));
    }
}

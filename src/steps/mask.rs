//! Masking steps for sensitive columns.

use crate::context::ExecutionContext;
use crate::error::StepError;
use crate::row::{Row, Value};

use super::{StepOutcome, require};

/// Walk the pattern against the column text: `#` reveals the next
/// source character, `x` consumes one and emits `x`, any other pattern
/// character is emitted literally without consuming source. Output ends
/// with the pattern.
pub(super) fn mask_number(
    mut row: Row,
    column: &str,
    pattern: &str,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = row.value(pos).to_text();
    let mut source = text.chars();
    let mut out = String::with_capacity(pattern.len());
    for p in pattern.chars() {
        match p {
            '#' => {
                if let Some(c) = source.next() {
                    out.push(c);
                }
            }
            'x' => {
                if source.next().is_some() {
                    out.push('x');
                }
            }
            literal => out.push(literal),
        }
    }
    row.set_value(pos, Value::String(out));
    Ok(StepOutcome::Keep(row))
}

/// Substitute letters and digits with pseudo-random characters of the
/// same class. The stream is seeded from the context, so equal seeds
/// produce equal maskings and a value always masks the same way within
/// a run.
pub(super) fn mask_shuffle(
    mut row: Row,
    column: &str,
    ctx: &ExecutionContext,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = row.value(pos).to_text();
    let mut state = ctx.shuffle_seed();
    let masked: String = text
        .chars()
        .map(|c| {
            let r = splitmix64(&mut state);
            if c.is_ascii_lowercase() {
                char::from(b'a' + (r % 26) as u8)
            } else if c.is_ascii_uppercase() {
                char::from(b'A' + (r % 26) as u8)
            } else if c.is_ascii_digit() {
                char::from(b'0' + (r % 10) as u8)
            } else {
                c
            }
        })
        .collect();
    row.set_value(pos, Value::String(masked));
    Ok(StepOutcome::Keep(row))
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
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
    fn mask_number_reveals_hashes_only() {
        let row = Row::from_pairs([("ssn", "123456789")]);
        let out = keep(mask_number(row, "ssn", "xxx-xx-####"));
        assert_eq!(out.value_of("ssn"), Some(&Value::from("xxx-xx-6789")));
    }

    #[test]
    fn mask_number_stops_with_the_pattern() {
        let row = Row::from_pairs([("n", "1234")]);
        let out = keep(mask_number(row, "n", "##"));
        assert_eq!(out.value_of("n"), Some(&Value::from("12")));
    }

    #[test]
    fn mask_shuffle_is_deterministic_per_seed() {
        let mask = |seed| {
            let ctx = ExecutionContext::with_seed(seed);
            let row = Row::from_pairs([("c", "Secret123!")]);
            match keep(mask_shuffle(row, "c", &ctx)).value_of("c").cloned() {
                Some(Value::String(s)) => s,
                _ => unreachable!(),
            }
        };
        let a = mask(42);
        assert_eq!(a, mask(42));
        assert_ne!(a, mask(43));
        assert_ne!(a, "Secret123!");
    }

    #[test]
    fn mask_shuffle_preserves_character_classes() {
        let ctx = ExecutionContext::new();
        let row = Row::from_pairs([("c", "Ab1-")]);
        let out = keep(mask_shuffle(row, "c", &ctx));
        let Some(Value::String(masked)) = out.value_of("c") else {
            unreachable!()
        };
        let chars: Vec<char> = masked.chars().collect();
        assert!(chars[0].is_ascii_uppercase());
        assert!(chars[1].is_ascii_lowercase());
        assert!(chars[2].is_ascii_digit());
        assert_eq!(chars[3], '-');
    }
}

use std::collections::HashMap;

use evalexpr::{DefaultNumericTypes, Node, build_operator_tree};
use regex::Regex;

use crate::error::StepError;

/// Per-run state shared by every step of one executor.
///
/// Compiled regexes and expression trees are created lazily on first
/// use within a run, keyed by their literal text, and dropped with the
/// context. Contexts are never shared between executors.
#[derive(Debug)]
pub struct ExecutionContext {
    rows_seen: u64,
    shuffle_seed: u64,
    regexes: HashMap<String, Regex>,
    expressions: HashMap<String, Node<DefaultNumericTypes>>,
}

/// Default seed for the deterministic shuffle-masking stream.
const DEFAULT_SHUFFLE_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

impl ExecutionContext {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SHUFFLE_SEED)
    }

    /// A context whose `mask-shuffle` output is seeded explicitly.
    /// Equal seeds produce equal maskings across runs.
    pub fn with_seed(shuffle_seed: u64) -> Self {
        Self {
            rows_seen: 0,
            shuffle_seed,
            regexes: HashMap::new(),
            expressions: HashMap::new(),
        }
    }

    /// Number of input rows this context has seen so far.
    pub const fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    pub(crate) const fn shuffle_seed(&self) -> u64 {
        self.shuffle_seed
    }

    pub(crate) fn advance_row(&mut self) -> u64 {
        self.rows_seen += 1;
        self.rows_seen
    }

    /// Compiled regex for `pattern`, compiling and caching on first use.
    pub(crate) fn regex(&mut self, pattern: &str) -> Result<&Regex, StepError> {
        if !self.regexes.contains_key(pattern) {
            let compiled = Regex::new(pattern).map_err(|e| StepError::BadPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
            log::trace!("compiled regex {pattern:?}");
            self.regexes.insert(pattern.to_string(), compiled);
        }
        Ok(&self.regexes[pattern])
    }

    /// Compiled expression tree for `text`, compiling and caching on
    /// first use.
    pub(crate) fn expression(
        &mut self,
        text: &str,
    ) -> Result<&Node<DefaultNumericTypes>, StepError> {
        if !self.expressions.contains_key(text) {
            let node = build_operator_tree::<DefaultNumericTypes>(text).map_err(|e| {
                StepError::Expression {
                    expression: text.to_string(),
                    message: e.to_string(),
                }
            })?;
            log::trace!("compiled expression {text:?}");
            self.expressions.insert(text.to_string(), node);
        }
        Ok(&self.expressions[text])
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

//! The execution engine: runs a recipe's steps over a row stream with
//! KEEP/SKIP/MANY semantics.

use crate::context::ExecutionContext;
use crate::error::RecipeError;
use crate::parser::Recipe;
use crate::row::Row;
use crate::steps::StepOutcome;

/// Runs one recipe over rows, owning the per-run [`ExecutionContext`].
///
/// Execution is single-threaded and cooperative: no step suspends, and
/// [`Executor::execute_row`] is the cancellation boundary — callers
/// driving row-at-a-time can stop between rows. Contexts are never
/// shared; run parallel executors over disjoint row streams instead.
#[derive(Debug)]
pub struct Executor<'r> {
    recipe: &'r Recipe,
    context: ExecutionContext,
}

impl<'r> Executor<'r> {
    pub fn new(recipe: &'r Recipe) -> Self {
        Self::with_context(recipe, ExecutionContext::new())
    }

    /// An executor with a caller-configured context (e.g. a fixed
    /// shuffle seed).
    pub const fn with_context(recipe: &'r Recipe, context: ExecutionContext) -> Self {
        Self { recipe, context }
    }

    pub const fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Run every step against one input row.
    ///
    /// The working set starts as the row itself; KEEP replaces a row,
    /// SKIP silently drops it, MANY fans it out in emission order and
    /// later steps run on each fan-out row. A step error aborts the
    /// row and surfaces with directive text and line number.
    pub fn execute_row(&mut self, row: Row) -> Result<Vec<Row>, RecipeError> {
        let row_no = self.context.advance_row();
        let mut working = vec![row];
        for descriptor in self.recipe.steps() {
            let mut next = Vec::with_capacity(working.len());
            for row in working {
                match descriptor.step.execute(row, &mut self.context) {
                    Ok(StepOutcome::Keep(row)) => next.push(row),
                    Ok(StepOutcome::Skip) => {
                        log::debug!("row {row_no} skipped at line {}", descriptor.line);
                    }
                    Ok(StepOutcome::Many(rows)) => {
                        log::debug!(
                            "row {row_no} fanned out into {} at line {}",
                            rows.len(),
                            descriptor.line
                        );
                        next.extend(rows);
                    }
                    Err(source) => {
                        return Err(RecipeError {
                            directive: descriptor.text.clone(),
                            line: descriptor.line,
                            source,
                        });
                    }
                }
            }
            working = next;
            if working.is_empty() {
                break;
            }
        }
        Ok(working)
    }

    /// Run the recipe over many rows, aborting on the first step
    /// error. Surviving rows come out in input order, fan-out rows in
    /// the order their parent step produced them.
    pub fn execute(
        &mut self,
        rows: impl IntoIterator<Item = Row>,
    ) -> Result<Vec<Row>, RecipeError> {
        let mut out = Vec::new();
        for row in rows {
            out.extend(self.execute_row(row)?);
        }
        log::trace!(
            "recipe of {} steps emitted {} rows from {} inputs",
            self.recipe.len(),
            out.len(),
            self.context.rows_seen()
        );
        Ok(out)
    }
}

/// One-shot convenience: run `recipe` over `rows` with a fresh context.
pub fn apply(recipe: &Recipe, rows: Vec<Row>) -> Result<Vec<Row>, RecipeError> {
    Executor::new(recipe).execute(rows)
}

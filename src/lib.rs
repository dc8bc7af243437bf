//! Recipe-driven row transformation engine.
//!
//! A recipe is a line-oriented DSL: one directive per line, each a
//! small transformation over an ordered row of named values. [`parse`]
//! validates the text into a [`Recipe`]; an [`Executor`] runs it over
//! rows with per-row KEEP/SKIP/fan-out semantics.
//!
//! ```
//! use rowrecipe::{Row, apply, parse};
//!
//! let recipe = parse("rename qty quantity\nfilter-row-if-true quantity == 0")?;
//! let rows = vec![
//!     Row::from_pairs([("qty", 3i64)]),
//!     Row::from_pairs([("qty", 0i64)]),
//! ];
//! let out = apply(&recipe, rows)?;
//! assert_eq!(out.len(), 1);
//! assert_eq!(out[0].value_of("quantity"), Some(&rowrecipe::Value::Int(3)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod context;
pub mod error;
pub mod executor;
pub mod parser;
pub mod row;
pub mod steps;
mod tokenizer;

pub use context::ExecutionContext;
pub use error::{ParseError, RecipeError, StepError};
pub use executor::{Executor, apply};
pub use parser::{Recipe, StepDescriptor, parse};
pub use row::{Row, Value};
pub use steps::{Step, StepOutcome};

use thiserror::Error;

/// A failure raised while translating DSL text into a recipe.
///
/// Every variant carries the 1-based line number of the offending
/// directive; variants tied to a known directive also carry its usage
/// template verbatim, so callers can render actionable messages without
/// string matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown directive '{name}' at line {line}")]
    UnknownDirective { name: String, line: usize },

    #[error("Missing field '{field}' at line {line} for directive {directive} (usage: {usage})")]
    MissingField {
        directive: &'static str,
        field: &'static str,
        usage: &'static str,
        line: usize,
    },

    #[error(
        "Invalid number '{token}' in field '{field}' at line {line} for directive {directive} (usage: {usage})"
    )]
    InvalidNumber {
        directive: &'static str,
        field: &'static str,
        token: String,
        usage: &'static str,
        line: usize,
    },

    #[error("{message} at line {line} for directive {directive} (usage: {usage})")]
    UnsupportedOption {
        directive: &'static str,
        message: String,
        usage: &'static str,
        line: usize,
    },

    #[error(
        "Field '{field}' must not be empty at line {line} for directive {directive} (usage: {usage})"
    )]
    EmptyLiteral {
        directive: &'static str,
        field: &'static str,
        usage: &'static str,
        line: usize,
    },

    #[error("Bad delimiter escape '{token}' at line {line} for directive {directive} (usage: {usage})")]
    BadDelimiter {
        directive: &'static str,
        token: String,
        usage: &'static str,
        line: usize,
    },
}

impl ParseError {
    /// 1-based line number the error points at.
    pub const fn line(&self) -> usize {
        match self {
            Self::UnknownDirective { line, .. }
            | Self::MissingField { line, .. }
            | Self::InvalidNumber { line, .. }
            | Self::UnsupportedOption { line, .. }
            | Self::EmptyLiteral { line, .. }
            | Self::BadDelimiter { line, .. } => *line,
        }
    }
}

/// A failure raised by a step while transforming one row.
///
/// Step errors describe why the row was structurally unsuitable for the
/// step; they carry no positional information themselves — the executor
/// wraps them into a [`RecipeError`] with directive text and line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("column '{0}' does not exist")]
    MissingColumn(String),

    #[error("column '{0}' already exists")]
    ColumnExists(String),

    #[error("column '{column}' holds {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("malformed value in column '{column}': {message}")]
    Malformed { column: String, message: String },

    #[error("invalid pattern '{pattern}': {message}")]
    BadPattern { pattern: String, message: String },

    #[error("expression '{expression}' failed: {message}")]
    Expression {
        expression: String,
        message: String,
    },

    #[error("row has {found} columns, directive names {expected}")]
    WidthMismatch { expected: usize, found: usize },
}

/// A step failure in the context of the recipe that raised it.
///
/// This is what executor callers see: the original directive text, its
/// 1-based line number, and the underlying [`StepError`] as the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{directive}' (line {line}): {source}")]
pub struct RecipeError {
    pub directive: String,
    pub line: usize,
    #[source]
    pub source: StepError,
}

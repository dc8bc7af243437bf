//! The step library: every directive compiles to one [`Step`] variant
//! with a single `execute` dispatch, keeping the directive set
//! exhaustiveness-checked.

mod dates;
mod expr;
mod fanout;
mod mask;
mod parse;
mod shape;
mod text;

pub use expr::{QuantizeRange, SedExpr};
pub use text::{CaseKind, CutRange};

use crate::context::ExecutionContext;
use crate::error::StepError;
use crate::row::Row;

/// Outcome of executing one step on one row.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The transformed row continues to the next step.
    Keep(Row),
    /// The row is dropped without error; later steps never see it.
    Skip,
    /// Fan-out: the row becomes several, in emission order.
    Many(Vec<Row>),
}

/// A compiled, validated directive. Parameters are checked at parse
/// time; regexes and expressions compile lazily in the run context.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Rename { old: String, new: String },
    Drop { column: String },
    Copy { src: String, dest: String, force: bool },
    Swap { a: String, b: String },
    Merge { a: String, b: String, dest: String, separator: String },
    Columns { names: Vec<String> },
    Flatten { columns: Vec<String> },
    ChangeCase { column: String, kind: CaseKind },
    IndexSplit { src: String, start: i64, end: i64, dest: String },
    Split { src: String, delimiter: char, first: String, second: String },
    SplitToRows { column: String, pattern: String },
    SplitToColumns { column: String, pattern: String },
    CharacterCut { src: String, dest: String, ranges: Vec<CutRange> },
    ParseAsCsv { column: String, delimiter: char, skip_empty: bool },
    SetFormatCsv { delimiter: char, skip_empty: bool },
    ParseAsJson { column: String, delete_source: bool },
    ParseXmlElement { column: String, delete_source: bool },
    ParseAsFixedLength { column: String, widths: Vec<usize>, padding: char },
    ParseAsXml { column: String },
    JsonPathEval { src: String, dest: String, path: String },
    XmlPathEval { src: String, dest: String, path: String },
    FormatDate { column: String, src_pattern: String, dst_pattern: String },
    FormatUnixTimestamp { column: String, pattern: String },
    MaskNumber { column: String, pattern: String },
    MaskShuffle { column: String },
    SetColumn { column: String, expression: String },
    FilterRowIfMatched { column: String, pattern: String },
    FilterRowIfTrue { expression: String },
    Sed { column: String, expr: SedExpr },
    Quantize { src: String, dest: String, ranges: Vec<QuantizeRange> },
    FillNullOrEmpty { column: String, value: String },
}

impl Step {
    /// Execute this step on one row. Steps are pure functions of
    /// (row, ctx); they never retain references across invocations.
    pub fn execute(
        &self,
        row: Row,
        ctx: &mut ExecutionContext,
    ) -> Result<StepOutcome, StepError> {
        match self {
            Self::Rename { old, new } => shape::rename(row, old, new),
            Self::Drop { column } => shape::drop_column(row, column),
            Self::Copy { src, dest, force } => shape::copy(row, src, dest, *force),
            Self::Swap { a, b } => shape::swap(row, a, b),
            Self::Merge {
                a,
                b,
                dest,
                separator,
            } => shape::merge(row, a, b, dest, separator),
            Self::Columns { names } => shape::columns(row, names),
            Self::Flatten { columns } => shape::flatten(row, columns),
            Self::ChangeCase { column, kind } => text::change_case(row, column, *kind),
            Self::IndexSplit {
                src,
                start,
                end,
                dest,
            } => text::index_split(row, src, *start, *end, dest),
            Self::Split {
                src,
                delimiter,
                first,
                second,
            } => text::split(row, src, *delimiter, first, second),
            Self::SplitToRows { column, pattern } => {
                fanout::split_to_rows(row, column, pattern, ctx)
            }
            Self::SplitToColumns { column, pattern } => {
                fanout::split_to_columns(row, column, pattern, ctx)
            }
            Self::CharacterCut { src, dest, ranges } => {
                text::character_cut(row, src, dest, ranges)
            }
            Self::ParseAsCsv {
                column,
                delimiter,
                skip_empty,
            } => parse::parse_as_csv(row, column, *delimiter, *skip_empty),
            Self::SetFormatCsv {
                delimiter,
                skip_empty,
            } => parse::set_format_csv(row, *delimiter, *skip_empty),
            Self::ParseAsJson {
                column,
                delete_source,
            } => parse::parse_as_json(row, column, *delete_source),
            Self::ParseXmlElement {
                column,
                delete_source,
            } => parse::parse_xml_element(row, column, *delete_source),
            Self::ParseAsFixedLength {
                column,
                widths,
                padding,
            } => parse::parse_as_fixed_length(row, column, widths, *padding),
            Self::ParseAsXml { column } => parse::parse_as_xml(row, column),
            Self::JsonPathEval { src, dest, path } => parse::json_path(row, src, dest, path),
            Self::XmlPathEval { src, dest, path } => parse::xml_path(row, src, dest, path),
            Self::FormatDate {
                column,
                src_pattern,
                dst_pattern,
            } => dates::format_date(row, column, src_pattern, dst_pattern),
            Self::FormatUnixTimestamp { column, pattern } => {
                dates::format_unix_timestamp(row, column, pattern)
            }
            Self::MaskNumber { column, pattern } => mask::mask_number(row, column, pattern),
            Self::MaskShuffle { column } => mask::mask_shuffle(row, column, ctx),
            Self::SetColumn { column, expression } => {
                expr::set_column(row, column, expression, ctx)
            }
            Self::FilterRowIfMatched { column, pattern } => {
                expr::filter_row_if_matched(row, column, pattern, ctx)
            }
            Self::FilterRowIfTrue { expression } => {
                expr::filter_row_if_true(row, expression, ctx)
            }
            Self::Sed {
                column,
                expr: substitution,
            } => expr::sed(row, column, substitution, ctx),
            Self::Quantize { src, dest, ranges } => expr::quantize(row, src, dest, ranges),
            Self::FillNullOrEmpty { column, value } => {
                expr::fill_null_or_empty(row, column, value)
            }
        }
    }
}

/// First-match position of a required column.
fn require(row: &Row, column: &str) -> Result<usize, StepError> {
    row.find(column)
        .ok_or_else(|| StepError::MissingColumn(column.to_string()))
}

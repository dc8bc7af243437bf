//! The directive registry: canonical name, usage template, and the
//! constructor that turns tokens into a validated [`Step`].

use crate::error::ParseError;
use crate::steps::{CaseKind, CutRange, QuantizeRange, SedExpr, Step};

use super::Args;

/// One registered directive. The usage template appears verbatim in
/// parse-error messages.
pub(crate) struct Directive {
    pub name: &'static str,
    pub usage: &'static str,
    pub build: fn(&mut Args<'_>) -> Result<Step, ParseError>,
}

/// Look up a directive by its registry key. The `set` family registers
/// under two-word keys (`set column`, `set columns`, `set format`).
pub(crate) fn lookup(name: &str) -> Option<&'static Directive> {
    DIRECTIVES.iter().find(|d| d.name == name)
}

static DIRECTIVES: &[Directive] = &[
    Directive {
        name: "rename",
        usage: "rename <old> <new>",
        build: |args| {
            Ok(Step::Rename {
                old: args.required("old")?,
                new: args.required("new")?,
            })
        },
    },
    Directive {
        name: "drop",
        usage: "drop <column>",
        build: |args| {
            Ok(Step::Drop {
                column: args.required("column")?,
            })
        },
    },
    Directive {
        name: "copy",
        usage: "copy <source> <destination> [force]",
        build: |args| {
            Ok(Step::Copy {
                src: args.required("source")?,
                dest: args.required("destination")?,
                force: args.optional_flag(),
            })
        },
    },
    Directive {
        name: "swap",
        usage: "swap <column-a> <column-b>",
        build: |args| {
            Ok(Step::Swap {
                a: args.required("column-a")?,
                b: args.required("column-b")?,
            })
        },
    },
    Directive {
        name: "merge",
        usage: "merge <column-a> <column-b> <destination> <separator>",
        build: |args| {
            Ok(Step::Merge {
                a: args.required("column-a")?,
                b: args.required("column-b")?,
                dest: args.required("destination")?,
                separator: args.required("separator")?,
            })
        },
    },
    Directive {
        name: "columns",
        usage: "columns <name>[,<name>...]",
        build: build_columns,
    },
    Directive {
        name: "flatten",
        usage: "flatten <column>[,<column>...]",
        build: |args| {
            let spec = args.rest("columns")?;
            let columns: Vec<String> = spec.split(',').map(|c| c.trim().to_string()).collect();
            if columns.iter().any(|c| c.contains('*')) {
                return Err(args.unsupported("Wildcards are not supported by flatten"));
            }
            if columns.iter().any(String::is_empty) {
                return Err(args.empty_literal("columns"));
            }
            Ok(Step::Flatten { columns })
        },
    },
    Directive {
        name: "uppercase",
        usage: "uppercase <column>",
        build: |args| {
            Ok(Step::ChangeCase {
                column: args.required("column")?,
                kind: CaseKind::Upper,
            })
        },
    },
    Directive {
        name: "lowercase",
        usage: "lowercase <column>",
        build: |args| {
            Ok(Step::ChangeCase {
                column: args.required("column")?,
                kind: CaseKind::Lower,
            })
        },
    },
    Directive {
        name: "titlecase",
        usage: "titlecase <column>",
        build: |args| {
            Ok(Step::ChangeCase {
                column: args.required("column")?,
                kind: CaseKind::Title,
            })
        },
    },
    Directive {
        name: "indexsplit",
        usage: "indexsplit <source> <start> <end> <destination>",
        build: |args| {
            Ok(Step::IndexSplit {
                src: args.required("source")?,
                start: args.integer("start")?,
                end: args.integer("end")?,
                dest: args.required("destination")?,
            })
        },
    },
    Directive {
        name: "split",
        usage: "split <source> <delimiter> <first-column> <second-column>",
        build: |args| {
            Ok(Step::Split {
                src: args.required("source")?,
                delimiter: args.delimiter("delimiter")?,
                first: args.required("first-column")?,
                second: args.required("second-column")?,
            })
        },
    },
    Directive {
        name: "split-to-rows",
        usage: "split-to-rows <column> <regex>",
        build: |args| {
            Ok(Step::SplitToRows {
                column: args.required("column")?,
                pattern: args.rest("regex")?,
            })
        },
    },
    Directive {
        name: "split-to-columns",
        usage: "split-to-columns <column> <regex>",
        build: |args| {
            Ok(Step::SplitToColumns {
                column: args.required("column")?,
                pattern: args.rest("regex")?,
            })
        },
    },
    Directive {
        name: "character-cut",
        usage: "character-cut <source> <destination> -c <range>",
        build: |args| {
            let src = args.required("source")?;
            let dest = args.required("destination")?;
            let option = args.required("option")?;
            if option == "-d" {
                return Err(args.unsupported("Option '-d' is not supported, only '-c'"));
            }
            if option != "-c" {
                return Err(args.unsupported(format!("Unknown option '{option}', expected '-c'")));
            }
            let spec = args.rest("range")?;
            let ranges = CutRange::parse_list(&spec)
                .map_err(|token| args.invalid_number("range", &token))?;
            Ok(Step::CharacterCut { src, dest, ranges })
        },
    },
    Directive {
        name: "parse-as-csv",
        usage: "parse-as-csv <column> <delimiter> [skip-empty]",
        build: |args| {
            Ok(Step::ParseAsCsv {
                column: args.required("column")?,
                delimiter: args.delimiter("delimiter")?,
                skip_empty: args.optional_flag(),
            })
        },
    },
    Directive {
        name: "parse-as-json",
        usage: "parse-as-json <column> [delete-column]",
        build: |args| {
            Ok(Step::ParseAsJson {
                column: args.required("column")?,
                delete_source: args.optional_flag(),
            })
        },
    },
    Directive {
        name: "parse-xml-element",
        usage: "parse-xml-element <column> [delete-column]",
        build: |args| {
            Ok(Step::ParseXmlElement {
                column: args.required("column")?,
                delete_source: args.optional_flag(),
            })
        },
    },
    Directive {
        name: "parse-as-fixed-length",
        usage: "parse-as-fixed-length <column> <width>[,<width>...] [padding]",
        build: |args| {
            let column = args.required("column")?;
            let spec = args.required("widths")?;
            let widths = spec
                .split(',')
                .map(|w| {
                    let w = w.trim();
                    w.parse::<usize>()
                        .ok()
                        .filter(|w| *w > 0)
                        .ok_or_else(|| args.invalid_number("widths", w))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let padding = args.optional_delimiter(' ')?;
            Ok(Step::ParseAsFixedLength {
                column,
                widths,
                padding,
            })
        },
    },
    Directive {
        name: "parse-as-xml",
        usage: "parse-as-xml <column>",
        build: |args| {
            Ok(Step::ParseAsXml {
                column: args.required("column")?,
            })
        },
    },
    Directive {
        name: "json-path",
        usage: "json-path <source> <destination> <json-path>",
        build: |args| {
            Ok(Step::JsonPathEval {
                src: args.required("source")?,
                dest: args.required("destination")?,
                path: args.rest("json-path")?,
            })
        },
    },
    Directive {
        name: "xml-path",
        usage: "xml-path <source> <destination> <xml-path>",
        build: |args| {
            Ok(Step::XmlPathEval {
                src: args.required("source")?,
                dest: args.required("destination")?,
                path: args.rest("xml-path")?,
            })
        },
    },
    Directive {
        name: "format-date",
        usage: "format-date <column> <source-pattern> <destination-pattern>",
        build: |args| {
            Ok(Step::FormatDate {
                column: args.required("column")?,
                src_pattern: args.required("source-pattern")?,
                dst_pattern: args.rest("destination-pattern")?,
            })
        },
    },
    Directive {
        name: "format-unix-timestamp",
        usage: "format-unix-timestamp <column> <pattern>",
        build: |args| {
            Ok(Step::FormatUnixTimestamp {
                column: args.required("column")?,
                pattern: args.rest("pattern")?,
            })
        },
    },
    Directive {
        name: "mask-number",
        usage: "mask-number <column> <pattern>",
        build: |args| {
            Ok(Step::MaskNumber {
                column: args.required("column")?,
                pattern: args.required("pattern")?,
            })
        },
    },
    Directive {
        name: "mask-shuffle",
        usage: "mask-shuffle <column>",
        build: |args| {
            Ok(Step::MaskShuffle {
                column: args.required("column")?,
            })
        },
    },
    Directive {
        name: "set column",
        usage: "set column <column> <expression>",
        build: |args| {
            Ok(Step::SetColumn {
                column: args.required("column")?,
                expression: args.rest("expression")?,
            })
        },
    },
    Directive {
        name: "set columns",
        usage: "set columns <name>[,<name>...]",
        build: build_columns,
    },
    Directive {
        name: "set format",
        usage: "set format csv <delimiter> [skip-empty]",
        build: |args| {
            let format = args.required("format")?;
            if format != "csv" {
                return Err(args.unsupported(format!(
                    "Unknown format '{format}', only csv is supported"
                )));
            }
            Ok(Step::SetFormatCsv {
                delimiter: args.delimiter("delimiter")?,
                skip_empty: args.optional_flag(),
            })
        },
    },
    Directive {
        name: "filter-row-if-matched",
        usage: "filter-row-if-matched <column> <regex>",
        build: |args| {
            let column = args.required("column")?;
            let raw = args.rest("regex")?;
            Ok(Step::FilterRowIfMatched {
                column,
                pattern: strip_slashes(&raw).to_string(),
            })
        },
    },
    Directive {
        name: "filter-row-if-true",
        usage: "filter-row-if-true <condition>",
        build: |args| {
            Ok(Step::FilterRowIfTrue {
                expression: args.rest("condition")?,
            })
        },
    },
    Directive {
        name: "sed",
        usage: "sed <column> <expression>",
        build: |args| {
            let column = args.required("column")?;
            let raw = args.rest("expression")?;
            let expr = SedExpr::parse(&raw).map_err(|reason| args.unsupported(reason))?;
            Ok(Step::Sed { column, expr })
        },
    },
    Directive {
        name: "quantize",
        usage: "quantize <source> <destination> <low>:<high>=<label>[,...]",
        build: |args| {
            let src = args.required("source")?;
            let dest = args.required("destination")?;
            let spec = args.rest("ranges")?;
            let ranges = QuantizeRange::parse_list(&spec)
                .map_err(|token| args.invalid_number("ranges", &token))?;
            Ok(Step::Quantize { src, dest, ranges })
        },
    },
    Directive {
        name: "fill-null-or-empty",
        usage: "fill-null-or-empty <column> <fixed-value>",
        build: |args| {
            let column = args.required("column")?;
            let value = args.optional_rest().unwrap_or_default();
            if value.is_empty() {
                return Err(args.empty_literal("fixed-value"));
            }
            Ok(Step::FillNullOrEmpty { column, value })
        },
    },
];

/// Shared by `columns` and its `set columns` spelling.
fn build_columns(args: &mut Args<'_>) -> Result<Step, ParseError> {
    let spec = args.rest("names")?;
    let names: Vec<String> = spec.split(',').map(|c| c.trim().to_string()).collect();
    if names.iter().any(String::is_empty) {
        return Err(args.empty_literal("names"));
    }
    Ok(Step::Columns { names })
}

/// `/pattern/` → `pattern`; anything else passes through untouched.
fn strip_slashes(raw: &str) -> &str {
    raw.strip_prefix('/')
        .and_then(|r| r.strip_suffix('/'))
        .filter(|inner| !inner.is_empty())
        .unwrap_or(raw)
}

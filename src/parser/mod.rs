//! The recipe parser: newline-separated DSL text in, a validated,
//! ordered list of step descriptors out.

mod registry;

use crate::error::ParseError;
use crate::steps::Step;
use crate::tokenizer::{TokenMode, Tokenizer};

/// The compiled form of one directive line.
///
/// Constructed by the parser, consumed by the executor, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDescriptor {
    /// 1-based line number in the source recipe.
    pub line: usize,
    /// The directive text as written (trimmed).
    pub text: String,
    pub step: Step,
}

/// An ordered list of step descriptors. Parsing is deterministic:
/// equal DSL text yields equal recipes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recipe {
    steps: Vec<StepDescriptor>,
}

impl Recipe {
    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Parse UTF-8 DSL text into a recipe.
///
/// One directive per line; blank lines advance the line counter but
/// produce no step; trailing `\r` and surrounding whitespace are
/// trimmed. The first whitespace token is the directive name — the
/// first two for the `set` family.
pub fn parse(text: &str) -> Result<Recipe, ParseError> {
    let mut steps = Vec::new();
    for (idx, raw) in text.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r').trim();
        if line.is_empty() {
            continue;
        }
        let mut tok = Tokenizer::new(line);
        let Some(first) = tok.next(TokenMode::Whitespace) else {
            continue;
        };

        let key = if first == "set" {
            match tok.next(TokenMode::Whitespace) {
                Some(sub) => format!("set {sub}"),
                None => {
                    return Err(ParseError::MissingField {
                        directive: "set",
                        field: "type",
                        usage: "set <column|columns|format> ...",
                        line: line_no,
                    });
                }
            }
        } else {
            first.to_string()
        };

        let Some(directive) = registry::lookup(&key) else {
            return Err(ParseError::UnknownDirective {
                name: key,
                line: line_no,
            });
        };

        let mut args = Args::new(tok, directive.name, directive.usage, line_no);
        let step = (directive.build)(&mut args)?;
        steps.push(StepDescriptor {
            line: line_no,
            text: line.to_string(),
            step,
        });
    }
    Ok(Recipe { steps })
}

/// Argument cursor handed to directive constructors. Wraps the
/// tokenizer with the directive's identity so every error carries the
/// name, the offending field, the usage template, and the line number.
pub(crate) struct Args<'a> {
    tok: Tokenizer<'a>,
    directive: &'static str,
    usage: &'static str,
    line: usize,
}

impl<'a> Args<'a> {
    const fn new(
        tok: Tokenizer<'a>,
        directive: &'static str,
        usage: &'static str,
        line: usize,
    ) -> Self {
        Self {
            tok,
            directive,
            usage,
            line,
        }
    }

    /// Next whitespace token; missing → `MissingField`.
    pub fn required(&mut self, field: &'static str) -> Result<String, ParseError> {
        self.tok
            .next(TokenMode::Whitespace)
            .map(ToString::to_string)
            .ok_or_else(|| self.missing(field))
    }

    /// The trimmed remainder of the line; empty → `MissingField`.
    pub fn rest(&mut self, field: &'static str) -> Result<String, ParseError> {
        self.tok
            .next(TokenMode::ToEndOfLine)
            .map(ToString::to_string)
            .ok_or_else(|| self.missing(field))
    }

    /// The trimmed remainder of the line, if any.
    pub fn optional_rest(&mut self) -> Option<String> {
        self.tok
            .next(TokenMode::ToEndOfLine)
            .map(ToString::to_string)
    }

    /// Optional trailing flag: `true` (any case) → true, anything else
    /// (or nothing) → false.
    pub fn optional_flag(&mut self) -> bool {
        self.tok
            .next(TokenMode::Whitespace)
            .is_some_and(|t| t.eq_ignore_ascii_case("true"))
    }

    /// Required integer token.
    pub fn integer(&mut self, field: &'static str) -> Result<i64, ParseError> {
        let token = self.required(field)?;
        token
            .parse()
            .map_err(|_| self.invalid_number(field, &token))
    }

    /// Required single-character delimiter with escape resolution: a
    /// token starting with `\` resolves standard string escapes and
    /// takes the first character of the result; otherwise the first
    /// character of the raw token.
    pub fn delimiter(&mut self, field: &'static str) -> Result<char, ParseError> {
        let token = self.required(field)?;
        self.resolve_delimiter(&token)
    }

    /// Optional delimiter token, falling back to `default`.
    pub fn optional_delimiter(&mut self, default: char) -> Result<char, ParseError> {
        match self.tok.next(TokenMode::Whitespace) {
            Some(token) => {
                let token = token.to_string();
                self.resolve_delimiter(&token)
            }
            None => Ok(default),
        }
    }

    fn resolve_delimiter(&self, token: &str) -> Result<char, ParseError> {
        if let Some(rest) = token.strip_prefix('\\') {
            let resolved = match rest.chars().next() {
                Some('t') => '\t',
                Some('n') => '\n',
                Some('r') => '\r',
                Some('0') => '\0',
                Some('\\') => '\\',
                Some('"') => '"',
                Some('\'') => '\'',
                _ => return Err(self.bad_delimiter(token)),
            };
            return Ok(resolved);
        }
        token.chars().next().ok_or_else(|| self.bad_delimiter(token))
    }

    fn missing(&self, field: &'static str) -> ParseError {
        ParseError::MissingField {
            directive: self.directive,
            field,
            usage: self.usage,
            line: self.line,
        }
    }

    pub fn invalid_number(&self, field: &'static str, token: &str) -> ParseError {
        ParseError::InvalidNumber {
            directive: self.directive,
            field,
            token: token.to_string(),
            usage: self.usage,
            line: self.line,
        }
    }

    pub fn unsupported(&self, message: impl Into<String>) -> ParseError {
        ParseError::UnsupportedOption {
            directive: self.directive,
            message: message.into(),
            usage: self.usage,
            line: self.line,
        }
    }

    pub fn empty_literal(&self, field: &'static str) -> ParseError {
        ParseError::EmptyLiteral {
            directive: self.directive,
            field,
            usage: self.usage,
            line: self.line,
        }
    }

    fn bad_delimiter(&self, token: &str) -> ParseError {
        ParseError::BadDelimiter {
            directive: self.directive,
            token: token.to_string(),
            usage: self.usage,
            line: self.line,
        }
    }
}

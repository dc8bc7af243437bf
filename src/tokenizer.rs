/// How [`Tokenizer::next`] consumes the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// The next maximal run of non-whitespace characters.
    Whitespace,
    /// The remainder of the line, trimmed. Used for trailing free-form
    /// arguments — expressions, regexes, paths, date patterns, ranges.
    ToEndOfLine,
}

/// A stateful cursor over a single directive line.
///
/// The mode is passed per call rather than held as hidden state, so a
/// directive parser can pull whitespace tokens and then switch to
/// end-of-line for its last argument.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    /// Next token under `mode`, or `None` when the line is exhausted.
    pub fn next(&mut self, mode: TokenMode) -> Option<&'a str> {
        let rest = &self.line[self.pos..];
        match mode {
            TokenMode::Whitespace => {
                let start = rest.find(|c: char| !c.is_whitespace())?;
                let after = &rest[start..];
                let len = after
                    .find(char::is_whitespace)
                    .unwrap_or(after.len());
                self.pos += start + len;
                Some(&after[..len])
            }
            TokenMode::ToEndOfLine => {
                self.pos = self.line.len();
                let trimmed = rest.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
        }
    }
}

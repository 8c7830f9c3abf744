use std::ops::Range;

use thiserror::Error;

/// Classification of a [`ParseError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input below the token level, e.g. an unterminated block
    /// comment.
    Lexical,
    /// Unexpected or missing token, unbalanced delimiters, malformed
    /// permutation member.
    Syntax,
    /// Undefined or cyclic macro, detected when the reference is resolved.
    Macro,
    /// Nesting deeper than the configured ceiling.
    Resource,
}

/// Error produced while parsing a script.
///
/// Carries the message text and the half-open byte span of the offending
/// token, suitable for caret-highlighting by a front end.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    /// Classification of the failure.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Start of the offending span, inclusive.
    pub start: usize,
    /// End of the offending span, exclusive.
    pub end: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            start,
            end,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, start: usize, end: usize) -> Self {
        Self::new(ErrorKind::Syntax, message, start, end)
    }

    /// Returns the offending span.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Error produced while rendering a tree back to text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrintError {
    /// The notation has no token (and no printable fallback) for a move.
    #[error("notation has no token for {0}")]
    NoTokenForMove(cubescript_notation::Move),
}

//! Error types for the composition parser

use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Why a composition string could not be turned into a tree.
///
/// A failed record never yields a partial tree: the caller either gets the
/// whole composition or one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Grammar mismatch: {0}")]
    GrammarMismatch(ParseFailure),

    #[error("Nesting deeper than {limit} levels: {failure}")]
    UnboundedNesting { limit: usize, failure: ParseFailure },

    #[error("Parse budget exhausted after {steps} steps: {failure}")]
    BudgetExhausted { steps: usize, failure: ParseFailure },
}

impl Error {
    pub fn failure(&self) -> &ParseFailure {
        match self {
            Error::GrammarMismatch(failure) => failure,
            Error::UnboundedNesting { failure, .. } => failure,
            Error::BudgetExhausted { failure, .. } => failure,
        }
    }

    /// Byte offset at which parsing stopped.
    pub fn offset(&self) -> usize {
        self.failure().offset
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Error::GrammarMismatch(_))
    }
}

/// Diagnostic snapshot of a failed parse.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseFailure {
    /// Byte offset where the composition stopped matching.
    pub offset: usize,
    /// Deepest byte offset any rule reached before failing.
    pub furthest: usize,
    /// What the grammar expected at `furthest`.
    pub expected: Vec<String>,
    /// Unconsumed input starting at `offset`, bounded in length.
    pub remainder: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stopped at byte {}", self.offset)?;
        if !self.expected.is_empty() {
            write!(
                f,
                " (expected {} at byte {})",
                self.expected.join(" or "),
                self.furthest
            )?;
        }
        write!(f, ", remaining `{}`", self.remainder)
    }
}

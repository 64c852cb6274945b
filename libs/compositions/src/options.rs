//! Parse configuration

use std::time::Duration;

/// Options for a single parse.
///
/// The grammar itself is static; these only control diagnostics and the
/// guards against pathological input.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    /// If `true`, each alternative of the substance priority lists is logged at
    /// `trace` level with its position and whether it matched.
    pub verbose: bool,
    /// Maximum nesting of parenthesized name parts and self-referencing clauses.
    pub max_nesting: usize,
    /// Maximum number of primitive matching steps per parse.
    ///
    /// Valid input takes a few hundred steps per byte, so a fixed limit also
    /// rejects long well-formed text. Unlimited by default; [`crate::parse_batch`]
    /// scales a limit to each record's length when this is `None`.
    pub max_steps: Option<usize>,
    /// Wall-clock budget per parse, checked periodically.
    pub time_budget: Option<Duration>,
    /// Length (in characters) of the remainder snippet kept in a [`crate::ParseFailure`].
    pub snippet_len: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            max_nesting: 32,
            max_steps: None,
            time_budget: None,
            snippet_len: 40,
        }
    }
}

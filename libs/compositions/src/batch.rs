//! Per-record batch driver
//!
//! Parses many composition strings, one per package record. A record that
//! fails, including one that runs out of its step or time budget, is reported
//! with its identifier and never stops the rest of the batch.

use crate::ast::Composition;
use crate::error::{Error, Result};
use crate::options::ParseOptions;
use crate::parser::Parser;

/// Step allowance per input byte when the options set no `max_steps`.
pub const BATCH_STEPS_PER_BYTE: usize = 2_000;

/// Lower bound of the length-scaled step allowance.
pub const BATCH_MIN_STEPS: usize = 200_000;

/// Result of parsing one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub id: String,
    pub result: Result<Composition>,
}

/// Counts per outcome class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchSummary {
    pub total: usize,
    pub parsed: usize,
    pub mismatched: usize,
    pub nesting: usize,
    pub exhausted: usize,
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn successes(&self) -> impl Iterator<Item = (&str, &Composition)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.result {
            Ok(composition) => Some((outcome.id.as_str(), composition)),
            Err(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.result {
            Ok(_) => None,
            Err(error) => Some((outcome.id.as_str(), error)),
        })
    }

    /// Ids of records that ran out of budget.
    pub fn exhausted_ids(&self) -> Vec<&str> {
        self.failures()
            .filter(|(_, error)| matches!(error, Error::BudgetExhausted { .. }))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.outcomes.len(),
            ..BatchSummary::default()
        };
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(_) => summary.parsed += 1,
                Err(Error::GrammarMismatch(_)) => summary.mismatched += 1,
                Err(Error::UnboundedNesting { .. }) => summary.nesting += 1,
                Err(Error::BudgetExhausted { .. }) => summary.exhausted += 1,
            }
        }
        summary
    }
}

/// Parse `(id, text)` records independently with the same options.
///
/// Without an explicit `max_steps`, each record gets
/// `max(BATCH_MIN_STEPS, BATCH_STEPS_PER_BYTE * len)` steps.
///
/// # Example
///
/// ```
/// use oddb_compositions::{parse_batch, ParseOptions};
///
/// let records = [("7680001", "Calcium 5 mg"), ("7680002", "Calcium (5 mg")];
/// let report = parse_batch(records, &ParseOptions::default());
/// assert_eq!(report.summary().parsed, 1);
/// assert_eq!(report.failures().next().map(|(id, _)| id), Some("7680002"));
/// ```
pub fn parse_batch<I, K, T>(records: I, options: &ParseOptions) -> BatchReport
where
    I: IntoIterator<Item = (K, T)>,
    K: Into<String>,
    T: AsRef<str>,
{
    let outcomes: Vec<RecordOutcome> = records
        .into_iter()
        .map(|(id, text)| {
            let id: String = id.into();
            let text = text.as_ref();
            let mut options = options.clone();
            if options.max_steps.is_none() {
                options.max_steps = Some(step_allowance(text));
            }
            let result = Parser::with_options(text, options).parse();
            if let Err(error) = &result {
                match error {
                    Error::BudgetExhausted { steps, .. } => {
                        tracing::warn!(record = %id, steps, "composition parse ran out of budget");
                    }
                    Error::UnboundedNesting { limit, .. } => {
                        tracing::warn!(record = %id, limit, "composition nested too deeply");
                    }
                    Error::GrammarMismatch(failure) => tracing::warn!(
                        record = %id,
                        offset = failure.offset,
                        remainder = %failure.remainder,
                        "composition did not parse"
                    ),
                }
            }
            RecordOutcome { id, result }
        })
        .collect();

    let report = BatchReport { outcomes };
    let summary = report.summary();
    tracing::info!(
        total = summary.total,
        parsed = summary.parsed,
        mismatched = summary.mismatched,
        nesting = summary.nesting,
        exhausted = summary.exhausted,
        "composition batch finished"
    );
    report
}

fn step_allowance(text: &str) -> usize {
    text.len()
        .saturating_mul(BATCH_STEPS_PER_BYTE)
        .max(BATCH_MIN_STEPS)
}

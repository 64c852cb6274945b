//! Composition parser for Swissmedic package lists
//!
//! The "Zusammensetzung" column of the Swissmedic package spreadsheet describes
//! each package's active substances, doses, excipients and cross-references as
//! free text, mixing Latin nomenclature with German, French and Italian
//! connector phrases. This crate recovers the structure of that text.
//!
//! # Architecture Overview
//!
//! ```text
//! Composition String
//!      |
//!   Lexical primitives (number, identifier, word, whitespace)
//!      |
//!   Dose grammar  +  Substance-name grammar
//!      |
//!   Special substances (additives, DER, excipients, corresp., ut ...)
//!      |
//!   Composition assembler -> Composition tree | ParseFailure
//! ```
//!
//! The grammar is an ordered-choice (PEG) grammar evaluated by recursive
//! descent: every rule is a method `(position) -> Step<T>` on [`Parser`],
//! alternatives are tried in a fixed order and the first match wins. Rules
//! never mutate a shared cursor, so a failed alternative leaves nothing to
//! roll back.
//!
//! ```
//! let composition = oddb_compositions::parse("Calcii carbonas 500 mg corresp. Calcium 200 mg").unwrap();
//! let calcium = &composition.groups[0].members[0];
//! assert_eq!(calcium.name.as_deref(), Some("Calcii carbonas"));
//! ```

#![forbid(unsafe_code)]

pub mod ast;
pub mod batch;
mod dose;
pub mod error;
mod label;
mod lexer;
mod name;
pub mod options;
pub mod parser;
mod substance;

pub use ast::{
    Composition, DecimalSeparator, Dose, Label, LabelGroup, Number, Quantity, Substance,
    SubstanceKind,
};
pub use batch::{parse_batch, BatchReport, BatchSummary, RecordOutcome};
pub use dose::UNITS;
pub use error::{Error, ParseFailure, Result};
pub use name::RESERVED_PHRASES;
pub use options::ParseOptions;
pub use parser::Parser;

/// Parse a composition with default options.
pub fn parse(text: &str) -> Result<Composition> {
    Parser::new(text).parse()
}

/// Parse a composition with explicit options.
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Composition> {
    Parser::with_options(text, options.clone()).parse()
}

/// Parse a stand-alone dose such as `200 U.I.` or `min. 5-10 mg`.
pub fn parse_dose(text: &str) -> Result<Dose> {
    Parser::new(text).parse_dose()
}

/// Parse exactly one substance entry, without separators or labels.
pub fn parse_substance(text: &str) -> Result<Substance> {
    Parser::new(text).parse_substance()
}

//! Composition parser - converts composition strings to a tree
//!
//! Ordered-choice recursive descent. Every grammar rule is a method that takes
//! the byte position to start at and returns a [`Step`]: the produced value and
//! the position right after it, or [`NoMatch`]. Positions are plain values, so
//! a failed alternative has nothing to undo and the next one simply starts
//! from the same position.
//!
//! Rule layers (lowest first):
//! 1. lexical primitives: number, identifier, word, whitespace (`lexer`)
//! 2. dose: quantity, range, unit vocabulary, `min.` (`dose`)
//! 3. substance names and reserved phrases (`name`)
//! 4. special substances and the `substance` priority list (`substance`)
//! 5. labels (`label`) and the composition assembler (this module)
//!
//! Grammar of the assembler:
//! ```text
//! composition   := leading_label? space? group_members (group_boundary group_members)*
//! group_members := (one_substance separator?)+
//! one_substance := preparation | histamine | substance
//! separator     := (','? space? 'ut alia: ' | ',' | 'et ') space?
//! group_boundary := [.,;:]? space? label space?
//! ```

use crate::ast::{Composition, Dose, Substance};
use crate::error::{Error, ParseFailure, Result};
use crate::options::ParseOptions;
use std::time::Instant;

/// A rule did not match at the requested position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NoMatch;

/// Outcome of a rule: value and next position.
pub(crate) type Step<T> = std::result::Result<(T, usize), NoMatch>;

/// A named rule in an ordered-choice list.
pub(crate) type Rule<'a, T> = (&'static str, fn(&mut Parser<'a>, usize) -> Step<T>);

/// Steps between two checks of the wall-clock budget.
const CLOCK_INTERVAL: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    Nesting { at: usize },
    Budget { at: usize },
}

/// Parser for one composition string
pub struct Parser<'a> {
    input: &'a str,
    options: ParseOptions,
    depth: usize,
    steps: usize,
    started: Instant,
    abort: Option<Abort>,
    furthest: usize,
    expected: Vec<&'static str>,
}

impl<'a> Parser<'a> {
    /// Create a parser with default options
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, ParseOptions::default())
    }

    pub fn with_options(input: &'a str, options: ParseOptions) -> Self {
        Self {
            input,
            options,
            depth: 0,
            steps: 0,
            started: Instant::now(),
            abort: None,
            furthest: 0,
            expected: Vec::new(),
        }
    }

    /// Parse the entire input as a composition (top-level entry point)
    pub fn parse(&mut self) -> Result<Composition> {
        self.run(Self::composition)
    }

    /// Parse the entire input as a single dose
    pub fn parse_dose(&mut self) -> Result<Dose> {
        self.run(Self::dose)
    }

    /// Parse the entire input as a single substance entry
    pub fn parse_substance(&mut self) -> Result<Substance> {
        self.run(Self::one_substance)
    }

    fn run<T>(&mut self, rule: fn(&mut Self, usize) -> Step<T>) -> Result<T> {
        self.depth = 0;
        self.steps = 0;
        self.started = Instant::now();
        self.abort = None;
        self.furthest = 0;
        self.expected.clear();

        let outcome = rule(self, 0);

        if let Some(abort) = self.abort {
            let error = match abort {
                Abort::Nesting { at } => Error::UnboundedNesting {
                    limit: self.options.max_nesting,
                    failure: self.failure(at),
                },
                Abort::Budget { at } => Error::BudgetExhausted {
                    steps: self.steps,
                    failure: self.failure(at),
                },
            };
            tracing::debug!(error = %error, "composition parse aborted");
            return Err(error);
        }

        let stop = match outcome {
            Ok((value, end)) if end == self.input.len() => return Ok(value),
            Ok((_, end)) => end,
            Err(NoMatch) => 0,
        };
        self.note(stop, "end of input");
        let failure = self.failure(stop);
        tracing::debug!(
            offset = failure.offset,
            furthest = failure.furthest,
            "composition did not parse"
        );
        Err(Error::GrammarMismatch(failure))
    }

    fn failure(&self, offset: usize) -> ParseFailure {
        let expected = if self.furthest >= offset {
            self.expected.iter().map(|what| what.to_string()).collect()
        } else {
            Vec::new()
        };
        ParseFailure {
            offset,
            furthest: self.furthest.max(offset),
            expected,
            remainder: self
                .rest(offset)
                .chars()
                .take(self.options.snippet_len)
                .collect(),
        }
    }

    // ============================================
    // Evaluator plumbing
    // ============================================

    pub(crate) fn rest(&self, pos: usize) -> &'a str {
        self.input.get(pos..).unwrap_or_default()
    }

    pub(crate) fn slice(&self, from: usize, to: usize) -> &'a str {
        self.input.get(from..to).unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.input.len()
    }

    pub(crate) fn peek(&self, pos: usize) -> Option<char> {
        self.rest(pos).chars().next()
    }

    /// Position of the first char at or after `pos` not satisfying `pred`.
    pub(crate) fn scan_while(&self, pos: usize, pred: impl Fn(char) -> bool) -> usize {
        self.rest(pos)
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.input.len(), |(offset, _)| pos + offset)
    }

    /// Count one matching step against the budget.
    pub(crate) fn tick(&mut self, pos: usize) -> std::result::Result<(), NoMatch> {
        if self.abort.is_some() {
            return Err(NoMatch);
        }
        self.steps += 1;
        let over_steps = self.options.max_steps.is_some_and(|max| self.steps > max);
        let over_time = self.steps % CLOCK_INTERVAL == 0
            && self
                .options
                .time_budget
                .is_some_and(|budget| self.started.elapsed() > budget);
        if over_steps || over_time {
            self.abort = Some(Abort::Budget { at: pos });
            return Err(NoMatch);
        }
        Ok(())
    }

    /// Record what was expected at `pos` for failure diagnostics.
    pub(crate) fn note(&mut self, pos: usize, what: &'static str) {
        if pos > self.furthest {
            self.furthest = pos;
            self.expected.clear();
        }
        if pos == self.furthest && !self.expected.contains(&what) {
            self.expected.push(what);
        }
    }

    /// Match a literal
    pub(crate) fn lit(&mut self, pos: usize, literal: &str) -> Step<()> {
        self.tick(pos)?;
        if self.rest(pos).starts_with(literal) {
            Ok(((), pos + literal.len()))
        } else {
            Err(NoMatch)
        }
    }

    /// Match the first literal of `literals` that fits, in list order
    pub(crate) fn first_of(&mut self, pos: usize, literals: &[&'static str]) -> Step<&'static str> {
        for &literal in literals {
            if let Ok(((), next)) = self.lit(pos, literal) {
                return Ok((literal, next));
            }
        }
        Err(NoMatch)
    }

    /// Optional literal; returns the position after it, or `pos`.
    pub(crate) fn skip(&mut self, pos: usize, literal: &str) -> usize {
        self.lit(pos, literal).map_or(pos, |((), next)| next)
    }

    pub(crate) fn char_if(&mut self, pos: usize, pred: impl Fn(char) -> bool) -> Step<char> {
        self.tick(pos)?;
        match self.peek(pos) {
            Some(c) if pred(c) => Ok((c, pos + c.len_utf8())),
            _ => Err(NoMatch),
        }
    }

    /// `rule?`
    pub(crate) fn maybe<T>(
        &mut self,
        pos: usize,
        rule: impl FnOnce(&mut Self, usize) -> Step<T>,
    ) -> (Option<T>, usize) {
        match rule(self, pos) {
            Ok((value, next)) => (Some(value), next),
            Err(NoMatch) => (None, pos),
        }
    }

    /// `rule{min,}`; a zero-width match ends the repetition.
    pub(crate) fn repeat<T>(
        &mut self,
        pos: usize,
        min: usize,
        mut rule: impl FnMut(&mut Self, usize) -> Step<T>,
    ) -> Step<Vec<T>> {
        let mut items = Vec::new();
        let mut at = pos;
        while let Ok((item, next)) = rule(self, at) {
            if next == at {
                break;
            }
            items.push(item);
            at = next;
        }
        if items.len() < min {
            return Err(NoMatch);
        }
        Ok((items, at))
    }

    /// Zero-width negative lookahead: matches (consuming nothing) iff `rule` does not.
    pub(crate) fn absent<T>(
        &mut self,
        pos: usize,
        rule: impl FnOnce(&mut Self, usize) -> Step<T>,
    ) -> Step<()> {
        match rule(self, pos) {
            Ok(_) => Err(NoMatch),
            Err(NoMatch) if self.abort.is_some() => Err(NoMatch),
            Err(NoMatch) => Ok(((), pos)),
        }
    }

    /// Run a recursive rule one nesting level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        pos: usize,
        rule: impl FnOnce(&mut Self, usize) -> Step<T>,
    ) -> Step<T> {
        if self.depth >= self.options.max_nesting {
            if self.abort.is_none() {
                self.abort = Some(Abort::Nesting { at: pos });
            }
            return Err(NoMatch);
        }
        self.depth += 1;
        let outcome = rule(self, pos);
        self.depth -= 1;
        outcome
    }

    /// Try `rules` in order; the first match wins.
    pub(crate) fn first_rule<T>(&mut self, pos: usize, rules: &[Rule<'a, T>]) -> Step<T> {
        for (name, rule) in rules {
            let outcome = rule(self, pos);
            if self.options.verbose {
                tracing::trace!(rule = *name, pos, matched = outcome.is_ok(), "production");
            }
            if outcome.is_ok() {
                return outcome;
            }
        }
        Err(NoMatch)
    }

    // ============================================
    // Composition assembler
    // ============================================

    /// Parse composition: leading_label? space? group_members (group_boundary group_members)*
    fn composition(&mut self, pos: usize) -> Step<Composition> {
        let (head, at) = self.maybe(pos, Self::leading_label);
        let at = self.space_opt(at);
        let (members, mut at) = self.group_members(at)?;

        let mut groups = vec![Self::group(head, members)];
        while let Ok((head, next)) = self.group_boundary(at) {
            let Ok((members, next)) = self.group_members(next) else {
                break;
            };
            groups.push(Self::group(Some(head), members));
            at = next;
        }

        Ok((Composition { groups }, at))
    }

    /// Parse group members: (one_substance separator?)+ up to the next label
    fn group_members(&mut self, pos: usize) -> Step<Vec<Substance>> {
        let mut members = Vec::new();
        let mut at = pos;
        loop {
            if !members.is_empty() && self.group_boundary(at).is_ok() {
                break;
            }
            let Ok((substance, next)) = self.one_substance(at) else {
                break;
            };
            members.push(substance);
            at = self.maybe(next, Self::separator).1;
        }

        if members.is_empty() {
            self.note(pos, "substance");
            return Err(NoMatch);
        }
        Ok((members, at))
    }

    /// Parse one substance: preparation | histamine | substance
    pub(crate) fn one_substance(&mut self, pos: usize) -> Step<Substance> {
        let rules: [Rule<'a, Substance>; 3] = [
            ("preparation", Self::preparation),
            ("histamine", Self::histamine),
            ("substance", Self::substance),
        ];
        self.first_rule(pos, &rules)
    }

    /// Parse separator: (','? space? 'ut alia: ' | ',' | 'et ') space?
    fn separator(&mut self, pos: usize) -> Step<()> {
        let ((), at) = self
            .ut_alia(pos)
            .or_else(|_| self.first_of(pos, &[",", "et "]).map(|(_, next)| ((), next)))?;
        Ok(((), self.space_opt(at)))
    }

    fn ut_alia(&mut self, pos: usize) -> Step<()> {
        let at = self.skip(pos, ",");
        let at = self.space_opt(at);
        self.lit(at, "ut alia: ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_consumes_nothing() {
        let mut parser = Parser::new("corresp. X");
        assert_eq!(parser.absent(0, |p, at| p.lit(at, "corresp.")), Err(NoMatch));
        assert_eq!(parser.absent(0, |p, at| p.lit(at, "ut ")), Ok(((), 0)));
    }

    #[test]
    fn test_repeat_minimum() {
        let mut parser = Parser::new("aaab");
        let (items, end) = parser.repeat(0, 1, |p, at| p.lit(at, "a")).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(end, 3);
        assert!(parser.repeat(3, 1, |p, at| p.lit(at, "a")).is_err());
    }

    #[test]
    fn test_first_of_respects_order() {
        let mut parser = Parser::new("U.I.");
        assert_eq!(parser.first_of(0, &["U.", "U.I."]), Ok(("U.", 2)));
        assert_eq!(parser.first_of(0, &["U.I.", "U."]), Ok(("U.I.", 4)));
    }

    #[test]
    fn test_scan_while_handles_multibyte() {
        let parser = Parser::new("µg/dm² x");
        assert_eq!(parser.scan_while(0, |c| c != ' '), "µg/dm²".len());
    }

    #[test]
    fn test_step_budget_aborts() {
        let options = ParseOptions {
            max_steps: Some(10),
            ..ParseOptions::default()
        };
        let mut parser = Parser::with_options("Calcii carbonas 500 mg", options);
        let err = parser.parse().unwrap_err();
        assert!(matches!(err, Error::BudgetExhausted { .. }));
    }
}

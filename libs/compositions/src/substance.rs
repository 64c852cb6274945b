//! Special-substance grammars and the `substance` priority list
//!
//! ```text
//! substance          := ratio | solvent | der correspondence? | excipient | color_additive
//!                     | composite | more_info finished | finished
//! finished           := simple_substance correspondence? space? (excipient_total | 'pro dosi')?
//! excipient_total    := total_phrase dose space? ratio_entry?
//! simple_substance   := substance_name space? dose? space? ratio_entry?
//! substance_name     := (der | color_additive | name_with_parenthesis | name_without_parenthesis)
//!                       '.'? 'pro dosi'?
//! correspondence     := (', corresp.' | 'corresp.') space? (simple_substance | dose)
//! composite          := (lead simple_substance | simple_substance) ut_clause+ space?
//! ut_clause          := space? [:,]? space? 'ut ' space? !'alia:'
//!                       (excipient | substance_name space? 'corresp.' space simple_substance | simple_substance)
//! more_info          := (!('ratio:' | 'ut alia:') (identifier | digits) space?)+ space? ('U.:' | ':') space?
//! ```
//!
//! Excipients and solvents run to the end of their label group: the end of
//! input, or the first `.`, `,`, `;` or `:` that is followed by whitespace and
//! a label.

use crate::ast::{Dose, Quantity, Substance, SubstanceKind};
use crate::parser::{NoMatch, Parser, Rule, Step};

/// Category prefixes of colour additives, each followed by whitespace.
const COLOR_PREFIXES: [&str; 5] = ["antiox.:", "Überzug:", "arom.:", "color.:", "conserv.:"];

/// Excipient phrases that name the total the excipient makes up.
const EXCIPIENT_TOTALS: [&str; 8] = [
    "excipiens ad solutionem pro ",
    "aqua q.s. ad gelatume pro ",
    "aqua q.s. ad solutionem pro ",
    "aqua q.s. ad suspensionem pro ",
    "q.s. ad pulverem pro ",
    "excipiens ad emulsionem pro ",
    "excipiens ad pulverem pro ",
    "aqua ad iniectabilia q.s. ad solutionem pro ",
];

const EXCIPIENT_PHRASES: [&str; 11] = [
    "excipiens",
    "ad pulverem",
    "pro charta",
    "aqua ad iniectabilia q.s. ad solutionem",
    "ad solutionem",
    "q.s. ad",
    "aqua q.s. ad",
    "saccharum ad",
    "aether q.s.",
    "aqua ad iniectabilia",
    "ana partes",
];

const HISTAMINE: &str = "U = Histamin Equivalent Prick";

impl<'a> Parser<'a> {
    /// Parse substance: the special forms in priority order, plain substances last
    pub(crate) fn substance(&mut self, pos: usize) -> Step<Substance> {
        let rules: [Rule<'a, Substance>; 8] = [
            ("ratio", Self::ratio),
            ("solvent", Self::solvent),
            ("der", Self::der_with_correspondence),
            ("excipient", Self::excipient),
            ("color additive", Self::color_additive),
            ("composite", Self::composite),
            ("annotated substance", Self::annotated_substance),
            ("finished substance", Self::finished_substance),
        ];
        self.first_rule(pos, &rules)
    }

    /// Parse ratio: 'ratio:' space [0-9:\-.]+ space?
    fn ratio(&mut self, pos: usize) -> Step<Substance> {
        let (ratio, at) = self.ratio_entry(pos)?;
        let mut substance = Substance::new(SubstanceKind::Ratio);
        substance.ratio = Some(ratio);
        Ok((substance, at))
    }

    fn ratio_entry(&mut self, pos: usize) -> Step<String> {
        let ((), at) = self.lit(pos, "ratio:")?;
        let ((), start) = self.space(at)?;
        let end = self.scan_while(start, |c| c.is_ascii_digit() || matches!(c, ':' | '-' | '.'));
        if end == start {
            self.note(start, "ratio");
            return Err(NoMatch);
        }
        let value = self.slice(start, end).to_string();
        Ok((value, self.space_opt(end)))
    }

    /// Parse solvent: ('Solvens:' | 'Solvens (i.m.):') space free_text
    fn solvent(&mut self, pos: usize) -> Step<Substance> {
        let (_, at) = self.first_of(pos, &["Solvens:", "Solvens (i.m.):"])?;
        let ((), start) = self.space(at)?;
        let end = self.tail_end(start);
        let description = self.slice(start, end).trim_end();

        let solute = self
            .nested(start, |p, at| {
                let (solute, next) = p.substance(at)?;
                let next = p.skip(next, "/L");
                if p.space_opt(next) == end {
                    Ok((solute, end))
                } else {
                    Err(NoMatch)
                }
            })
            .ok()
            .map(|(solute, _)| Box::new(solute));

        let substance = Substance::new(SubstanceKind::Solvent {
            description: description.to_string(),
            solute,
        });
        Ok((substance, end))
    }

    /// Parse DER: 'DER:' space [0-9] [0-9.\-:]* space?
    fn der(&mut self, pos: usize) -> Step<Substance> {
        let ((), at) = self.lit(pos, "DER:")?;
        let ((), start) = self.space(at)?;
        let (_, at) = self.char_if(start, |c| c.is_ascii_digit())?;
        let end = self.scan_while(at, |c| c.is_ascii_digit() || matches!(c, '.' | '-' | ':'));
        let mut substance = Substance::new(SubstanceKind::Extract);
        substance.ratio = Some(self.slice(start, end).to_string());
        Ok((substance, self.space_opt(end)))
    }

    fn der_with_correspondence(&mut self, pos: usize) -> Step<Substance> {
        let (mut substance, at) = self.der(pos)?;
        let (reference, at) = self.maybe(at, Self::correspondence);
        substance.correspondence = reference.map(Box::new);
        Ok((substance, at))
    }

    /// Parse excipient: (total_phrase dose space? ratio_entry? | phrase) space? free_text
    fn excipient(&mut self, pos: usize) -> Step<Substance> {
        let (dose, ratio, at) = match self.excipient_total(pos) {
            Ok(((dose, ratio), next)) => (Some(dose), ratio, next),
            Err(_) => {
                let (_, next) = self.first_of(pos, &EXCIPIENT_PHRASES)?;
                (None, None, next)
            }
        };
        let at = self.space_opt(at);
        let end = self.tail_end(at);

        let mut substance = Substance::new(SubstanceKind::Excipient {
            text: self.slice(pos, end).trim_end().to_string(),
        });
        substance.dose = dose;
        substance.ratio = ratio;
        Ok((substance, end))
    }

    fn excipient_total(&mut self, pos: usize) -> Step<(Dose, Option<String>)> {
        let (_, at) = self.first_of(pos, &EXCIPIENT_TOTALS)?;
        let (dose, at) = self.dose(at)?;
        let at = self.space_opt(at);
        let (ratio, at) = self.maybe(at, Self::ratio_entry);
        Ok(((dose, ratio), at))
    }

    /// Parse color additive: (prefix space)? 'E' space [0-9]+ [(a-z)]{0,3} space? dose? space?
    fn color_additive(&mut self, pos: usize) -> Step<Substance> {
        let (prefix, at) = match self.first_of(pos, &COLOR_PREFIXES) {
            Ok((prefix, next)) => match self.space(next) {
                Ok(((), next)) => (Some(prefix), next),
                Err(_) => (None, pos),
            },
            Err(_) => (None, pos),
        };
        let ((), at) = self.lit(at, "E")?;
        let ((), start) = self.space(at)?;
        let (_, at) = self.digits(start)?;
        let mut end = at;
        for _ in 0..3 {
            match self.char_if(end, |c| c.is_ascii_lowercase() || c == '(' || c == ')') {
                Ok((_, next)) => end = next,
                Err(_) => break,
            }
        }
        let code = self.slice(start, end);

        let at = self.space_opt(end);
        let (dose, at) = self.maybe(at, Self::dose);
        let at = self.space_opt(at);

        let mut substance = Substance::new(SubstanceKind::ColorAdditive {
            code: code.to_string(),
        });
        substance.name = Some(format!("E {}", code));
        substance.dose = dose;
        substance.more_info = prefix.map(|prefix| prefix.trim_end_matches(':').to_string());
        Ok((substance, at))
    }

    /// Parse composite: (lead simple_substance | simple_substance) ut_clause+ space?
    fn composite(&mut self, pos: usize) -> Step<Substance> {
        let (mut lead, at) = self
            .led_substance(pos)
            .or_else(|_| self.simple_substance(pos))?;
        let (parts, at) = self.repeat(at, 1, Self::ut_clause)?;
        lead.parts = parts;
        Ok((lead, self.space_opt(at)))
    }

    /// Parse lead: ('residui:' | 'mineralia:' | 'Solvens:') space? simple_substance | more_info simple_substance
    fn led_substance(&mut self, pos: usize) -> Step<Substance> {
        let (info, at) = match self.first_of(pos, &["residui:", "mineralia:", "Solvens:"]) {
            Ok((marker, next)) => (marker.trim_end_matches(':').to_string(), self.space_opt(next)),
            Err(_) => self.more_info(pos)?,
        };
        let (mut substance, at) = self.simple_substance(at)?;
        substance.more_info = Some(info);
        Ok((substance, at))
    }

    /// Parse ut clause: space? [:,]? space? 'ut ' space? !'alia:' part
    fn ut_clause(&mut self, pos: usize) -> Step<Substance> {
        let at = self.space_opt(pos);
        let at = match self.char_if(at, |c| c == ':' || c == ',') {
            Ok((_, next)) => self.space_opt(next),
            Err(_) => at,
        };
        let ((), at) = self.lit(at, "ut ")?;
        let at = self.space_opt(at);
        self.absent(at, |p, at| p.lit(at, "alia:"))?;
        self.excipient(at)
            .or_else(|_| self.name_with_correspondence(at))
            .or_else(|_| self.simple_substance(at))
    }

    /// Parse substance_name space? 'corresp.' space simple_substance
    fn name_with_correspondence(&mut self, pos: usize) -> Step<Substance> {
        let (mut substance, at) = self.substance_name(pos)?;
        let at = self.space_opt(at);
        let ((), at) = self.lit(at, "corresp.")?;
        let ((), at) = self.space(at)?;
        let (reference, at) = self.simple_substance(at)?;
        substance.correspondence = Some(Box::new(reference));
        Ok((substance, at))
    }

    /// Parse more info: (!('ratio:' | 'ut alia:') (identifier | digits) space?)+ space? ('U.:' | ':') space?
    fn more_info(&mut self, pos: usize) -> Step<String> {
        let (_, end) = self.repeat(pos, 1, |p, at| {
            p.absent(at, |p, at| p.first_of(at, &["ratio:", "ut alia:"]))?;
            let (_, at) = p.identifier(at).or_else(|_| p.digits(at))?;
            Ok(((), p.space_opt(at)))
        })?;
        let info = self.slice(pos, end).trim_end().to_string();
        let at = self.space_opt(end);
        let (_, at) = self.first_of(at, &["U.:", ":"])?;
        Ok((info, self.space_opt(at)))
    }

    fn annotated_substance(&mut self, pos: usize) -> Step<Substance> {
        let (info, at) = self.more_info(pos)?;
        let (mut substance, at) = self.finished_substance(at)?;
        substance.more_info = Some(info);
        Ok((substance, at))
    }

    /// Parse finished substance: simple_substance correspondence? space? (excipient_total | 'pro dosi')?
    ///
    /// A trailing total only takes the phrase, its dose and ratio. The
    /// separator and the next substance stay with the group.
    fn finished_substance(&mut self, pos: usize) -> Step<Substance> {
        let (mut substance, at) = self.simple_substance(pos)?;
        let (reference, at) = self.maybe(at, Self::correspondence);
        if let Some(reference) = reference {
            substance.correspondence = Some(Box::new(reference));
        }
        let at = self.space_opt(at);
        if let Ok(((total, ratio), next)) = self.excipient_total(at) {
            substance.total = Some(total);
            if substance.ratio.is_none() {
                substance.ratio = ratio;
            }
            return Ok((substance, next));
        }
        Ok((substance, self.skip(at, "pro dosi")))
    }

    /// Parse simple substance: substance_name space? dose? space? ratio_entry?
    pub(crate) fn simple_substance(&mut self, pos: usize) -> Step<Substance> {
        let (mut substance, at) = self.substance_name(pos)?;
        let at = self.space_opt(at);
        let (dose, at) = self.maybe(at, Self::dose);
        let at = self.space_opt(at);
        let (ratio, at) = self.maybe(at, Self::ratio_entry);
        if dose.is_some() {
            substance.dose = dose;
        }
        if ratio.is_some() {
            substance.ratio = ratio;
        }
        Ok((substance, at))
    }

    /// Parse substance name: (der | color_additive | name_with_parenthesis | name_without_parenthesis) '.'? 'pro dosi'?
    fn substance_name(&mut self, pos: usize) -> Step<Substance> {
        let (substance, at) = self
            .der(pos)
            .or_else(|_| self.color_additive(pos))
            .or_else(|_| {
                self.name_with_parenthesis(pos)
                    .map(|(name, next)| (Substance::named(name), next))
            })
            .or_else(|_| {
                self.name_without_parenthesis(pos)
                    .map(|(name, next)| (Substance::named(name), next))
            })?;
        let at = self.skip(at, ".");
        Ok((substance, self.skip(at, "pro dosi")))
    }

    /// Parse correspondence: (', corresp.' | 'corresp.') space? (simple_substance | dose)
    fn correspondence(&mut self, pos: usize) -> Step<Substance> {
        let (_, at) = self.first_of(pos, &[", corresp.", "corresp."])?;
        let at = self.space_opt(at);
        self.simple_substance(at).or_else(|_| {
            let (dose, next) = self.dose(at)?;
            let mut reference = Substance::new(SubstanceKind::Active);
            reference.dose = Some(dose);
            Ok((reference, next))
        })
    }

    /// Parse histamine: 'U = Histamin Equivalent Prick'
    pub(crate) fn histamine(&mut self, pos: usize) -> Step<Substance> {
        let ((), at) = self.lit(pos, HISTAMINE)?;
        let mut substance = Substance::new(SubstanceKind::Histamine);
        substance.name = Some(HISTAMINE.to_string());
        Ok((substance, at))
    }

    /// Parse preparation: heading? name+ number space 'U.:' space? annotation? !'ut '
    ///
    /// An annotation never starts with `ut `, which leaves `... U.: ut X` to the
    /// composite rule.
    pub(crate) fn preparation(&mut self, pos: usize) -> Step<Substance> {
        let (description, start) = self.maybe(pos, Self::preparation_heading);
        let (_, at) = self.repeat(start, 1, |p, at| {
            p.name_with_parenthesis(at)
                .or_else(|_| p.name_without_parenthesis(at))
        })?;
        let name = self.slice(start, at);
        let (quantity, at) = self.number(at)?;
        let ((), at) = self.space(at)?;
        let ((), at) = self.lit(at, "U.:")?;
        let at = self.space_opt(at);
        let (annotation, at) = self.maybe(at, |p, at| {
            p.absent(at, |p, at| p.lit(at, "ut "))?;
            let (_, end) = p.repeat(at, 1, |p, at| {
                let (_, at) = p.identifier(at)?;
                Ok(((), p.space_opt(at)))
            })?;
            Ok((p.slice(at, end).trim_end().to_string(), end))
        });
        self.absent(at, |p, at| p.lit(at, "ut "))?;

        let mut substance = Substance::named(name);
        substance.kind = SubstanceKind::Preparation { description };
        substance.dose = Some(Dose {
            quantity: Quantity::Single(quantity),
            unit: Some("U.".to_string()),
            minimum: false,
        });
        substance.more_info = annotation;
        Ok((substance, at))
    }

    /// Parse preparation heading: (word space?)+ ':' space?
    fn preparation_heading(&mut self, pos: usize) -> Step<String> {
        let (_, end) = self.repeat(pos, 1, |p, at| {
            let (_, at) = p.word(at)?;
            Ok(((), p.space_opt(at)))
        })?;
        let ((), at) = self.lit(end, ":")?;
        let heading = self.slice(pos, end).trim_end().to_string();
        Ok((heading, self.space_opt(at)))
    }

    /// End of the free text that starts at `pos`: the first `[.,;:]` followed by
    /// whitespace and a label, or the end of input.
    pub(crate) fn tail_end(&mut self, pos: usize) -> usize {
        for (offset, c) in self.rest(pos).char_indices() {
            if !matches!(c, '.' | ',' | ';' | ':') {
                continue;
            }
            let at = pos + offset;
            if let Ok(((), next)) = self.space(at + 1) {
                if self.label_mark(next).is_ok() {
                    return at;
                }
            }
        }
        self.len()
    }
}

//! Substance-name grammar
//!
//! A name is a run of words that ends in front of a reserved connector phrase.
//! Parenthesized asides may nest; radio-isotope notation such as
//! `yttrii(90-Y) chloridum` is one atomic token.
//!
//! ```text
//! name_without_parenthesis := (!('(' | reserved) (radio_isotope | '> 1000' | '> 500' | word) space?)+
//! name_with_parenthesis    := !reserved (!(',' | '(') any)* parenthesized
//!                             (!reserved (word | parenthesized | ')') space?)*
//! parenthesized            := '(' ([^()]+ | parenthesized)+ ')' '-like:'? space?
//! radio_isotope            := [a-zA-Z]+ '(' [0-9]+ '-' [a-zA-Z]+ ')' (space? [a-zA-Z])*
//! ```

use crate::parser::{NoMatch, Parser, Step};

/// Phrases that end a substance name, in the order they are tried.
///
/// A `<digits> <space> ':'` probe runs between `pro capsula` and `ad globulos`.
pub const RESERVED_PHRASES: [&str; 18] = [
    ", corresp.",
    "corresp.",
    "et ",
    "min. ",
    "ut ",
    "ut alia: ",
    "pro dosi",
    "pro capsula",
    "ad globulos",
    "ana ",
    "ana partes",
    "partes",
    "ad pulverem",
    "ad suspensionem",
    "q.s. ",
    "ad solutionem",
    "ad emulsionem",
    "excipiens",
];

/// Position of the number-colon probe within the reserved list.
const NUMBER_COLON_AT: usize = 8;

impl<'a> Parser<'a> {
    /// Parse reserved phrase: first match of RESERVED_PHRASES, number colon probe included
    pub(crate) fn reserved_phrase(&mut self, pos: usize) -> Step<()> {
        let (before, after) = RESERVED_PHRASES.split_at(NUMBER_COLON_AT);
        self.first_of(pos, before)
            .map(|(_, next)| ((), next))
            .or_else(|_| self.number_colon(pos))
            .or_else(|_| self.first_of(pos, after).map(|(_, next)| ((), next)))
    }

    /// Parse number colon: [0-9]+ space ':'
    fn number_colon(&mut self, pos: usize) -> Step<()> {
        let (_, at) = self.digits(pos)?;
        let ((), at) = self.space(at)?;
        self.lit(at, ":")
    }

    /// Parse name without parenthesis: (!('(' | reserved) name_token space?)+
    pub(crate) fn name_without_parenthesis(&mut self, pos: usize) -> Step<&'a str> {
        let (_, end) = self.repeat(pos, 1, |p, at| {
            p.absent(at, |p, at| p.lit(at, "(").or_else(|_| p.reserved_phrase(at)))?;
            let ((), at) = p
                .radio_isotope(at)
                .or_else(|_| p.first_of(at, &["> 1000", "> 500"]).map(|(_, n)| ((), n)))
                .or_else(|_| p.word(at).map(|(_, n)| ((), n)))?;
            Ok(((), p.space_opt(at)))
        })?;
        Ok((self.slice(pos, end), end))
    }

    /// Parse name with parenthesis: !reserved (!(',' | '(') any)* parenthesized (!reserved (word | parenthesized | ')') space?)*
    pub(crate) fn name_with_parenthesis(&mut self, pos: usize) -> Step<&'a str> {
        self.absent(pos, Self::reserved_phrase)?;
        let at = self.scan_while(pos, |c| c != ',' && c != '(');
        let ((), at) = self.parenthesized(at)?;
        let (_, end) = self.repeat(at, 0, |p, at| {
            p.absent(at, Self::reserved_phrase)?;
            let ((), at) = p
                .word(at)
                .map(|(_, n)| ((), n))
                .or_else(|_| p.parenthesized(at))
                .or_else(|_| p.lit(at, ")"))?;
            Ok(((), p.space_opt(at)))
        })?;
        Ok((self.slice(pos, end), end))
    }

    /// Parse parenthesized: '(' ([^()]+ | parenthesized)+ ')' '-like:'? space?
    pub(crate) fn parenthesized(&mut self, pos: usize) -> Step<()> {
        let ((), at) = self.lit(pos, "(")?;
        let (_, at) = self.nested(at, |p, at| {
            p.repeat(at, 1, |p, at| {
                p.tick(at)?;
                let run = p.scan_while(at, |c| c != '(' && c != ')');
                if run > at {
                    Ok(((), run))
                } else {
                    p.parenthesized(at)
                }
            })
        })?;
        let Ok(((), at)) = self.lit(at, ")") else {
            self.note(at, "closing parenthesis");
            return Err(NoMatch);
        };
        let at = self.skip(at, "-like:");
        Ok(((), self.space_opt(at)))
    }

    /// Parse radio isotope: [a-zA-Z]+ '(' [0-9]+ '-' [a-zA-Z]+ ')' (space? [a-zA-Z])*
    fn radio_isotope(&mut self, pos: usize) -> Step<()> {
        let (_, at) = self.ascii_letters(pos)?;
        let ((), at) = self.lit(at, "(")?;
        let (_, at) = self.digits(at)?;
        let ((), at) = self.lit(at, "-")?;
        let (_, at) = self.ascii_letters(at)?;
        let ((), mut at) = self.lit(at, ")")?;
        loop {
            let next = self.space_opt(at);
            match self.char_if(next, |c| c.is_ascii_alphabetic()) {
                Ok((_, after)) => at = after,
                Err(_) => break,
            }
        }
        Ok(((), at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn without(input: &str) -> Option<&str> {
        Parser::new(input)
            .name_without_parenthesis(0)
            .ok()
            .map(|(name, _)| name.trim_end())
    }

    fn with(input: &str) -> Option<&str> {
        Parser::new(input)
            .name_with_parenthesis(0)
            .ok()
            .map(|(name, _)| name.trim_end())
    }

    #[test]
    fn test_name_stops_at_dose() {
        assert_eq!(without("Calcii carbonas 500 mg"), Some("Calcii carbonas"));
    }

    #[test]
    fn test_name_stops_at_reserved_phrases() {
        assert_eq!(without("Kalii citras et Calcium"), Some("Kalii citras"));
        assert_eq!(without("Dermatophagoides ut alia: X"), Some("Dermatophagoides"));
        assert_eq!(without("Saccharum corresp. X"), Some("Saccharum"));
        assert_eq!(without("Mentholum ad solutionem"), Some("Mentholum"));
        assert_eq!(without("Lactosum excipiens"), Some("Lactosum"));
        assert_eq!(without("excipiens"), None);
    }

    #[test]
    fn test_reserved_probe_consumes_nothing() {
        let mut parser = Parser::new("et Calcium");
        assert!(parser.absent(0, Parser::reserved_phrase).is_err());
        let mut parser = Parser::new("Calcium");
        assert_eq!(parser.absent(0, Parser::reserved_phrase), Ok(((), 0)));
    }

    #[test]
    fn test_reserved_number_colon() {
        let mut parser = Parser::new("50 : rest");
        assert_eq!(parser.reserved_phrase(0), Ok(((), 4)));
    }

    #[test]
    fn test_name_stops_at_parenthesis() {
        assert_eq!(without("Xenonum (133-Xe)"), Some("Xenonum"));
    }

    #[test]
    fn test_radio_isotope_is_atomic() {
        assert_eq!(
            without("yttrii(90-Y) chloridum zum Kalibrierungszeitpunkt 10 MBq"),
            Some("yttrii(90-Y) chloridum zum Kalibrierungszeitpunkt")
        );
    }

    #[test]
    fn test_greater_than_tokens() {
        assert_eq!(without("Pollen > 1000, X"), Some("Pollen > 1000"));
    }

    #[test]
    fn test_name_with_parenthesis() {
        assert_eq!(with("Xenonum (133-Xe)"), Some("Xenonum (133-Xe)"));
        assert_eq!(
            with("Vitamin D3 (colecalciferolum) oleosum 10 mg"),
            Some("Vitamin D3 (colecalciferolum) oleosum")
        );
        assert_eq!(with("Calcium 5 mg"), None);
    }

    #[test]
    fn test_nested_parenthesis() {
        assert_eq!(
            with("Extractum (Radix (sicc.) et folium) 5 mg"),
            Some("Extractum (Radix (sicc.) et folium)")
        );
    }

    #[test]
    fn test_like_suffix() {
        let mut parser = Parser::new("(insulinum)-like: x");
        assert_eq!(parser.parenthesized(0), Ok(((), 18)));
    }

    #[test]
    fn test_unbalanced_parenthesis() {
        assert_eq!(with("Xenonum (133-Xe"), None);
    }
}

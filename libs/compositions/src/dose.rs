//! Dose grammar
//!
//! ```text
//! dose     := ('min.' space?)? (range | number) space? unit? space?
//! range    := number space? '-' space? number
//! unit     := first match of UNITS, in list order
//! ```

use crate::ast::{Dose, Quantity};
use crate::parser::{Parser, Step};

/// Unit vocabulary in matching order.
///
/// The order is the disambiguation policy: a unit that is a prefix of another
/// (`U.` of `U.I.`, `g` of `g/dm²`, `%` of `% V/V`) is listed after it.
pub const UNITS: [&str; 21] = [
    "g/dm²", "% V/V", "µg", "guttae", "mg/ml", "MBq", "CFU", "mg", "Mg", "kJ", "G", "g", "l", "µl",
    "ml", "µmol", "mmol", "U.I.", "U.", "Mia. U.", "%",
];

impl<'a> Parser<'a> {
    /// Parse dose: ('min.' space?)? (range | number) space? unit? space?
    pub(crate) fn dose(&mut self, pos: usize) -> Step<Dose> {
        let (minimum, at) = match self.lit(pos, "min.") {
            Ok(((), next)) => (true, self.space_opt(next)),
            Err(_) => (false, pos),
        };
        let (quantity, at) = self
            .range(at)
            .or_else(|_| self.number(at).map(|(n, next)| (Quantity::Single(n), next)))?;
        let at = self.space_opt(at);
        let (unit, at) = self.maybe(at, Self::unit);
        let at = self.space_opt(at);
        Ok((
            Dose {
                quantity,
                unit: unit.map(str::to_string),
                minimum,
            },
            at,
        ))
    }

    /// Parse range: number space? '-' space? number
    ///
    /// Bounds are kept as written; `low > high` is not rejected.
    fn range(&mut self, pos: usize) -> Step<Quantity> {
        let (low, at) = self.number(pos)?;
        let at = self.space_opt(at);
        let ((), at) = self.lit(at, "-")?;
        let at = self.space_opt(at);
        let (high, at) = self.number(at)?;
        Ok((Quantity::Range { low, high }, at))
    }

    /// Parse unit: first entry of UNITS that matches
    pub(crate) fn unit(&mut self, pos: usize) -> Step<&'static str> {
        let found = self.first_of(pos, &UNITS);
        if found.is_err() {
            self.note(pos, "dose unit");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DecimalSeparator;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dose(input: &str) -> (Dose, usize) {
        Parser::new(input).dose(0).unwrap()
    }

    #[test]
    fn test_dose_with_unit() {
        let (parsed, end) = dose("500 mg");
        assert_eq!(parsed.value(), Some(Decimal::from(500)));
        assert_eq!(parsed.unit.as_deref(), Some("mg"));
        assert!(!parsed.minimum);
        assert_eq!(end, 6);
    }

    #[test]
    fn test_longest_unit_wins() {
        let (parsed, end) = dose("200 U.I.");
        assert_eq!(parsed.unit.as_deref(), Some("U.I."));
        assert_eq!(end, 8);

        let (parsed, _) = dose("3 Mia. U.");
        assert_eq!(parsed.unit.as_deref(), Some("Mia. U."));

        let (parsed, _) = dose("40 % V/V");
        assert_eq!(parsed.unit.as_deref(), Some("% V/V"));

        let (parsed, _) = dose("2 mg/ml");
        assert_eq!(parsed.unit.as_deref(), Some("mg/ml"));
    }

    #[test]
    fn test_every_unit_matches_itself() {
        for unit in UNITS {
            let input = format!("5 {}", unit);
            let (parsed, end) = dose(&input);
            assert_eq!(parsed.unit.as_deref(), Some(unit), "{}", input);
            assert_eq!(end, input.len(), "{}", input);
        }
    }

    #[test]
    fn test_dose_without_unit() {
        let (parsed, end) = dose("12 ");
        assert_eq!(parsed.value(), Some(Decimal::from(12)));
        assert_eq!(parsed.unit, None);
        assert_eq!(end, 3);
    }

    #[test]
    fn test_range_single_trailing_unit() {
        let (parsed, end) = dose("40 - 55 mg");
        match &parsed.quantity {
            Quantity::Range { low, high } => {
                assert_eq!(low.value, Decimal::from(40));
                assert_eq!(high.value, Decimal::from(55));
            }
            other => panic!("expected range, got {:?}", other),
        }
        assert_eq!(parsed.unit.as_deref(), Some("mg"));
        assert_eq!(end, 10);
    }

    #[test]
    fn test_inverted_range_is_kept() {
        let (parsed, _) = dose("10-5 ml");
        assert_eq!(
            parsed.quantity,
            Quantity::Range {
                low: crate::ast::Number {
                    value: Decimal::from(10),
                    separator: DecimalSeparator::None
                },
                high: crate::ast::Number {
                    value: Decimal::from(5),
                    separator: DecimalSeparator::None
                },
            }
        );
    }

    #[test]
    fn test_minimum_qualifier() {
        let (parsed, _) = dose("min. 2,5 mg");
        assert!(parsed.minimum);
        assert_eq!(parsed.value(), Some(Decimal::from_str("2.5").unwrap()));
        assert_eq!(parsed.to_string(), "min. 2,5 mg");
    }

    #[test]
    fn test_dose_requires_number() {
        assert!(Parser::new("mg").dose(0).is_err());
    }
}

//! Composition tree
//!
//! Trees are built bottom-up by the grammar rules and never changed after the
//! parser hands them out. Source order is kept everywhere: groups, members and
//! `ut` parts appear exactly as the text lists them.

use rust_decimal::Decimal;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Root of a parsed composition string.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Composition {
    /// Label groups in source order. The implicit default group, if any, comes first.
    pub groups: Vec<LabelGroup>,
}

impl Composition {
    /// All top-level substances of all groups, in source order.
    pub fn substances(&self) -> impl Iterator<Item = &Substance> {
        self.groups.iter().flat_map(|group| group.members.iter())
    }

    /// The group of substances not introduced by a label.
    pub fn default_group(&self) -> Option<&LabelGroup> {
        self.groups.iter().find(|group| group.label_id.is_none())
    }
}

/// A run of substances, optionally introduced by a label like `I)` or `A):`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelGroup {
    /// `None` for the implicit default group.
    pub label_id: Option<Label>,
    /// Second label of a joined heading such as `I) et II)`.
    pub joined_with: Option<Label>,
    pub description: Option<String>,
    pub members: Vec<Substance>,
}

/// Roman numeral or letter used to tag a label group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Label {
    I,
    II,
    III,
    IV,
    V,
    A,
    B,
    C,
    D,
    E,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::I => "I",
            Label::II => "II",
            Label::III => "III",
            Label::IV => "IV",
            Label::V => "V",
            Label::A => "A",
            Label::B => "B",
            Label::C => "C",
            Label::D => "D",
            Label::E => "E",
        }
    }

    pub(crate) fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "I" => Label::I,
            "II" => Label::II,
            "III" => Label::III,
            "IV" => Label::IV,
            "V" => Label::V,
            "A" => Label::A,
            "B" => Label::B,
            "C" => Label::C,
            "D" => Label::D,
            "E" => Label::E,
            _ => return None,
        })
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a composition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Substance {
    /// Display name, trimmed. Excipients, ratios and bare correspondence doses have none.
    pub name: Option<String>,
    pub kind: SubstanceKind,
    pub dose: Option<Dose>,
    /// `ratio: 1:4` suffix, or the ratio of a `DER:` entry.
    pub ratio: Option<String>,
    /// Reference substance this one is dose-equivalent to (`corresp.`).
    pub correspondence: Option<Box<Substance>>,
    /// Amount of finished product the dose refers to (`excipiens ad solutionem pro 1 ml`).
    pub total: Option<Dose>,
    /// Informational prefix or annotation (`antiox.`, `residui`, ...).
    pub more_info: Option<String>,
    /// Sub-entries of an `ut` listing, in source order. Empty unless composite.
    pub parts: Vec<Substance>,
}

impl Substance {
    pub(crate) fn new(kind: SubstanceKind) -> Self {
        Self {
            name: None,
            kind,
            dose: None,
            ratio: None,
            correspondence: None,
            total: None,
            more_info: None,
            parts: Vec::new(),
        }
    }

    pub(crate) fn named(name: &str) -> Self {
        Self {
            name: Some(name.trim().to_string()),
            ..Self::new(SubstanceKind::Active)
        }
    }

    pub fn is_excipient(&self) -> bool {
        matches!(self.kind, SubstanceKind::Excipient { .. })
    }

    /// `true` for an `ut` listing (lead substance with "for" parts).
    pub fn is_composite(&self) -> bool {
        !self.parts.is_empty()
    }
}

impl fmt::Display for Substance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(info) = &self.more_info {
            write!(f, "{}:", info)?;
            sep = " ";
        }
        match (&self.kind, &self.name) {
            (SubstanceKind::Excipient { text }, _) => return write!(f, "{}{}", sep, text),
            (SubstanceKind::Solvent { description, .. }, _) => {
                return write!(f, "{}Solvens: {}", sep, description)
            }
            (SubstanceKind::Extract, _) => {
                write!(f, "{}DER: {}", sep, self.ratio.as_deref().unwrap_or_default())?;
                sep = " ";
            }
            (_, Some(name)) => {
                write!(f, "{}{}", sep, name)?;
                sep = " ";
            }
            (_, None) => {}
        }
        if let Some(dose) = &self.dose {
            write!(f, "{}{}", sep, dose)?;
            sep = " ";
        }
        if let (Some(ratio), false) = (&self.ratio, self.kind == SubstanceKind::Extract) {
            write!(f, "{}ratio: {}", sep, ratio)?;
        }
        if let Some(reference) = &self.correspondence {
            write!(f, " corresp. {}", reference)?;
        }
        if let Some(total) = &self.total {
            write!(f, " pro {}", total)?;
        }
        for part in &self.parts {
            write!(f, ", ut {}", part)?;
        }
        Ok(())
    }
}

/// What kind of entry a [`Substance`] is.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SubstanceKind {
    /// Ordinary named substance.
    Active,
    /// Colour additive or other E-numbered additive (`E 270`).
    ColorAdditive { code: String },
    /// Drug-extract ratio entry (`DER: 1:4`).
    Extract,
    /// Boilerplate filler phrase, including any free text after it.
    Excipient { text: String },
    /// `Solvens:` clause. `solute` is set when the description is itself a substance.
    Solvent {
        description: String,
        solute: Option<Box<Substance>>,
    },
    /// Stand-alone `ratio:` clause.
    Ratio,
    /// `U = Histamin Equivalent Prick`
    Histamine,
    /// Allergen preparation dosed in `U.:`.
    Preparation { description: Option<String> },
}

/// Quantity with optional unit from the closed unit vocabulary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dose {
    pub quantity: Quantity,
    pub unit: Option<String>,
    /// Set by a `min.` prefix. The numeric value is unaffected.
    pub minimum: bool,
}

impl Dose {
    /// Single value, if this is not a range.
    pub fn value(&self) -> Option<Decimal> {
        match &self.quantity {
            Quantity::Single(number) => Some(number.value),
            Quantity::Range { .. } => None,
        }
    }
}

impl fmt::Display for Dose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minimum {
            f.write_str("min. ")?;
        }
        match &self.quantity {
            Quantity::Single(number) => write!(f, "{}", number)?,
            Quantity::Range { low, high } => write!(f, "{}-{}", low, high)?,
        }
        if let Some(unit) = &self.unit {
            write!(f, " {}", unit)?;
        }
        Ok(())
    }
}

/// Single quantity or `low-high` range. Bounds are not required to be ordered.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quantity {
    Single(Number),
    Range { low: Number, high: Number },
}

/// Numeric literal normalized to an exact decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Number {
    pub value: Decimal,
    /// Decimal marker the source text used.
    pub separator: DecimalSeparator,
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.value.to_string();
        match self.separator.as_char() {
            Some(marker) => f.write_str(&text.replacen('.', &marker.to_string(), 1)),
            None => f.write_str(&text),
        }
    }
}

/// Decimal marker of a [`Number`]. All markers mean the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DecimalSeparator {
    #[default]
    None,
    Point,
    Comma,
    Caret,
}

impl DecimalSeparator {
    pub(crate) fn from_char(c: char) -> Self {
        match c {
            '.' => DecimalSeparator::Point,
            ',' => DecimalSeparator::Comma,
            '^' => DecimalSeparator::Caret,
            _ => DecimalSeparator::None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            DecimalSeparator::None => None,
            DecimalSeparator::Point => Some('.'),
            DecimalSeparator::Comma => Some(','),
            DecimalSeparator::Caret => Some('^'),
        }
    }
}

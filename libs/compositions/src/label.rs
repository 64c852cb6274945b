//! Label grammar
//!
//! ```text
//! label          := label_mark (space? [^:]* ':' space)?
//! label_mark     := label_id space? ('):' | ')') !','
//! leading_label  := joined_labels | label
//! joined_labels  := label_id label_separator (' et ' | ', ' | ' pro usu: ' | space)
//!                   label_id label_separator label_description?
//! group_boundary := [.,;:]? space? label space?
//! ```

use crate::ast::{Label, LabelGroup, Substance};
use crate::parser::{NoMatch, Parser, Step};

/// Label ids in matching order; longer numerals first.
const LABEL_IDS: [&str; 10] = ["V", "IV", "III", "II", "I", "A", "B", "C", "D", "E"];

/// Heading of a label group, before its members are known.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LabelHead {
    label_id: Label,
    joined_with: Option<Label>,
    description: Option<String>,
}

impl<'a> Parser<'a> {
    pub(crate) fn group(head: Option<LabelHead>, members: Vec<Substance>) -> LabelGroup {
        match head {
            Some(head) => LabelGroup {
                label_id: Some(head.label_id),
                joined_with: head.joined_with,
                description: head.description,
                members,
            },
            None => LabelGroup {
                label_id: None,
                joined_with: None,
                description: None,
                members,
            },
        }
    }

    fn label_id(&mut self, pos: usize) -> Step<Label> {
        let (id, at) = self.first_of(pos, &LABEL_IDS)?;
        let label = Label::from_id(id).ok_or(NoMatch)?;
        Ok((label, at))
    }

    fn label_separator(&mut self, pos: usize) -> Step<()> {
        self.first_of(pos, &["):", ")"]).map(|(_, next)| ((), next))
    }

    /// Parse label mark: label_id space? label_separator !','
    pub(crate) fn label_mark(&mut self, pos: usize) -> Step<Label> {
        let (label, at) = self.label_id(pos)?;
        let at = self.space_opt(at);
        let ((), at) = self.label_separator(at)?;
        self.absent(at, |p, at| p.lit(at, ","))?;
        Ok((label, at))
    }

    /// Parse label: label_mark label_description?
    fn label(&mut self, pos: usize) -> Step<LabelHead> {
        let (label_id, at) = self.label_mark(pos)?;
        let (description, at) = self.maybe(at, Self::label_description);
        let head = LabelHead {
            label_id,
            joined_with: None,
            description,
        };
        Ok((head, at))
    }

    /// Parse label description: space? [^:]* ':' space
    ///
    /// The text may not run into the next label group.
    fn label_description(&mut self, pos: usize) -> Step<String> {
        let start = self.space_opt(pos);
        let colon = self.scan_while(start, |c| c != ':');
        if self.tail_end(start) < colon {
            return Err(NoMatch);
        }
        let ((), at) = self.lit(colon, ":")?;
        let ((), at) = self.space(at)?;
        let description = self.slice(start, colon).trim_end().to_string();
        Ok((description, at))
    }

    /// Parse leading label: joined_labels | label
    pub(crate) fn leading_label(&mut self, pos: usize) -> Step<LabelHead> {
        self.joined_labels(pos).or_else(|_| self.label(pos))
    }

    /// Parse joined labels: label_id label_separator connector label_id label_separator label_description?
    fn joined_labels(&mut self, pos: usize) -> Step<LabelHead> {
        let (label_id, at) = self.label_id(pos)?;
        let ((), at) = self.label_separator(at)?;
        let at = match self.first_of(at, &[" et ", ", ", " pro usu: "]) {
            Ok((_, next)) => next,
            Err(_) => self.space(at)?.1,
        };
        let (joined, at) = self.label_id(at)?;
        let ((), at) = self.label_separator(at)?;
        let (description, at) = self.maybe(at, Self::label_description);
        let head = LabelHead {
            label_id,
            joined_with: Some(joined),
            description,
        };
        Ok((head, at))
    }

    /// Parse group boundary: [.,;:]? space? label space?
    pub(crate) fn group_boundary(&mut self, pos: usize) -> Step<LabelHead> {
        let at = match self.char_if(pos, |c| matches!(c, '.' | ',' | ';' | ':')) {
            Ok((_, next)) => next,
            Err(_) => pos,
        };
        let at = self.space_opt(at);
        let (head, at) = self.label(at)?;
        Ok((head, self.space_opt(at)))
    }
}

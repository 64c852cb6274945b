//! Lexical primitives
//!
//! Numbers, identifiers, words and whitespace. Each primitive either matches
//! at the given position and returns the position after it, or fails without
//! consuming anything.

use crate::ast::{DecimalSeparator, Number};
use crate::parser::{NoMatch, Parser, Step};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Accented letters that occur in substance names.
const ACCENTED: [char; 9] = ['é', 'à', 'è', 'ç', 'ï', 'ö', 'ä', 'ü', 'â'];

pub(crate) fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || ACCENTED.contains(&c)
}

/// Characters allowed inside a word after its first letter.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '\'' | '/') || ACCENTED.contains(&c)
}

fn is_identifier_char(c: char) -> bool {
    is_word_char(c) || c == '.'
}

impl<'a> Parser<'a> {
    /// Parse whitespace: \s+
    pub(crate) fn space(&mut self, pos: usize) -> Step<()> {
        self.tick(pos)?;
        let end = self.scan_while(pos, char::is_whitespace);
        if end == pos {
            return Err(NoMatch);
        }
        Ok(((), end))
    }

    /// Parse optional whitespace: \s*
    pub(crate) fn space_opt(&mut self, pos: usize) -> usize {
        self.space(pos).map_or(pos, |((), next)| next)
    }

    /// Parse digits: [0-9]+
    pub(crate) fn digits(&mut self, pos: usize) -> Step<&'a str> {
        self.tick(pos)?;
        let end = self.scan_while(pos, |c| c.is_ascii_digit());
        if end == pos {
            return Err(NoMatch);
        }
        Ok((self.slice(pos, end), end))
    }

    /// Parse number: '-'? ('0' | [1-9][0-9']*) ([.,^] [0-9]+)? ([eE] [+-]? [0-9]+)?
    pub(crate) fn number(&mut self, pos: usize) -> Step<Number> {
        self.tick(pos)?;
        let mut at = pos;
        let negative = self.peek(at) == Some('-');
        if negative {
            at += 1;
        }

        let int_start = at;
        match self.peek(at) {
            Some('0') => at += 1,
            Some('1'..='9') => at = self.scan_while(at + 1, |c| c.is_ascii_digit() || c == '\''),
            _ => {
                self.note(pos, "number");
                return Err(NoMatch);
            }
        }
        let integer = self.slice(int_start, at);

        let mut separator = DecimalSeparator::None;
        let mut fraction = "";
        if let Some(marker @ ('.' | ',' | '^')) = self.peek(at) {
            let end = self.scan_while(at + 1, |c| c.is_ascii_digit());
            if end > at + 1 {
                separator = DecimalSeparator::from_char(marker);
                fraction = self.slice(at + 1, end);
                at = end;
            }
        }

        let mut exponent = "";
        if let Some('e' | 'E') = self.peek(at) {
            let sign_end = match self.peek(at + 1) {
                Some('+' | '-') => at + 2,
                _ => at + 1,
            };
            let end = self.scan_while(sign_end, |c| c.is_ascii_digit());
            if end > sign_end {
                exponent = self.slice(at + 1, end);
                at = end;
            }
        }

        let value = decimal_value(negative, integer, fraction, exponent).ok_or(NoMatch)?;
        Ok((Number { value, separator }, at))
    }

    /// Parse identifier: ([a-zA-Z] | accented | [0-9] '-') [0-9a-zA-Z-'/.]*
    ///
    /// The run must contain at least one letter, so quantities never lex as identifiers.
    pub(crate) fn identifier(&mut self, pos: usize) -> Step<&'a str> {
        self.tick(pos)?;
        let body = match self.peek(pos) {
            Some(c) if is_letter(c) => pos + c.len_utf8(),
            Some(c) if c.is_ascii_digit() && self.peek(pos + 1) == Some('-') => pos + 2,
            _ => return Err(NoMatch),
        };
        let end = self.scan_while(body, is_identifier_char);
        let text = self.slice(pos, end);
        if !text.chars().any(is_letter) {
            return Err(NoMatch);
        }
        Ok((text, end))
    }

    /// Parse word: [0-9,-]* letter ([_,]? word_char)*
    ///
    /// Handles names like `acidum 9,11-linolicum`; a comma only stays inside the
    /// word when another word character follows it directly.
    pub(crate) fn word(&mut self, pos: usize) -> Step<&'a str> {
        self.tick(pos)?;
        let lead = self.scan_while(pos, |c| c.is_ascii_digit() || c == ',' || c == '-');
        let mut at = match self.peek(lead) {
            Some(c) if is_letter(c) => lead + c.len_utf8(),
            _ => return Err(NoMatch),
        };
        loop {
            let joint = match self.peek(at) {
                Some('_' | ',') => at + 1,
                _ => at,
            };
            match self.peek(joint) {
                Some(c) if is_word_char(c) => at = joint + c.len_utf8(),
                _ => break,
            }
        }
        Ok((self.slice(pos, at), at))
    }

    /// Parse ASCII letters: [a-zA-Z]+
    pub(crate) fn ascii_letters(&mut self, pos: usize) -> Step<&'a str> {
        self.tick(pos)?;
        let end = self.scan_while(pos, |c| c.is_ascii_alphabetic());
        if end == pos {
            return Err(NoMatch);
        }
        Ok((self.slice(pos, end), end))
    }
}

fn decimal_value(negative: bool, integer: &str, fraction: &str, exponent: &str) -> Option<Decimal> {
    let mut literal = String::with_capacity(integer.len() + fraction.len() + 2);
    if negative {
        literal.push('-');
    }
    literal.extend(integer.chars().filter(|&c| c != '\''));
    if !fraction.is_empty() {
        literal.push('.');
        literal.push_str(fraction);
    }
    if exponent.is_empty() {
        return Decimal::from_str(&literal).ok();
    }
    literal.push('e');
    literal.push_str(exponent.trim_start_matches('+'));
    Decimal::from_scientific(&literal).ok()
}

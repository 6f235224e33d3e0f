//! Life-like B/S rules.
//!
//! A rule is a pair of 9-bit masks over neighbor counts `0..=8`: bit `k` of
//! `birth` says a dead cell with `k` live neighbors comes alive, bit `k` of
//! `survival` says a live cell with `k` live neighbors stays alive.
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Rule {
    birth: u16,
    survival: u16,
}

#[derive(Debug, Eq, PartialEq, derive_more::Display, thiserror::Error)]
pub enum RuleParseError {
    /// No `/` between the birth and survival halves.
    MissingSeparator,

    /// A half didn't start with `B` or `S` as appropriate.
    BadPrefix,

    /// A character other than a digit `0..=8` inside a digit run.
    BadDigit(char),
}

/// Named rules a presenter can offer as a menu.  Data, not semantics: the
/// engine treats these exactly like any other parsed string.
pub const PRESETS: &[(&str, &str)] = &[
    ("Conway", "B3/S23"),
    ("HighLife", "B36/S23"),
    ("Seeds", "B2/S"),
    ("Life without Death", "B3/S012345678"),
    ("Maze", "B3/S12345"),
    ("Morley", "B368/S245"),
    ("Replicator", "B1357/S1357"),
    ("Diamoeba", "B35678/S5678"),
    ("Anneal", "B4678/S35678"),
    ("34 Life", "B34/S34"),
];

fn parse_digits(input: &str, prefix: char) -> Result<u16, RuleParseError> {
    let mut chars = input.chars();
    if !chars
        .next()
        .map(|c| c.eq_ignore_ascii_case(&prefix))
        .unwrap_or(false)
    {
        return Err(RuleParseError::BadPrefix);
    }

    let mut mask = 0u16;
    for c in chars {
        match c.to_digit(10) {
            Some(d) if d <= 8 => mask |= 1 << d,
            _ => return Err(RuleParseError::BadDigit(c)),
        }
    }
    Ok(mask)
}

impl Rule {
    /// Canonical Life, B3/S23.
    pub fn life() -> Rule {
        Rule {
            birth: 1 << 3,
            survival: (1 << 2) | (1 << 3),
        }
    }

    pub fn birth_contains(&self, count: u32) -> bool {
        debug_assert!(count <= 8);
        self.birth >> count & 1 != 0
    }

    pub fn survival_contains(&self, count: u32) -> bool {
        debug_assert!(count <= 8);
        self.survival >> count & 1 != 0
    }

    /// Parse and re-render, i.e. `"b63/s32"` becomes `"B36/S23"`.  Returns
    /// None when the input doesn't parse.
    pub fn normalize(input: &str) -> Option<String> {
        input.parse::<Rule>().ok().map(|r| r.to_string())
    }
}

impl Default for Rule {
    fn default() -> Rule {
        Rule::life()
    }
}

impl FromStr for Rule {
    type Err = RuleParseError;

    fn from_str(input: &str) -> Result<Rule, RuleParseError> {
        let trimmed = input.trim();
        let (b_half, s_half) = trimmed
            .split_once('/')
            .ok_or(RuleParseError::MissingSeparator)?;
        Ok(Rule {
            birth: parse_digits(b_half, 'B')?,
            survival: parse_digits(s_half, 'S')?,
        })
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "B")?;
        let mut b = self.birth;
        while b != 0 {
            write!(f, "{}", b.trailing_zeros())?;
            b &= b - 1;
        }
        write!(f, "/S")?;
        let mut s = self.survival;
        while s != 0 {
            write!(f, "{}", s.trailing_zeros())?;
            s &= s - 1;
        }
        Ok(())
    }
}

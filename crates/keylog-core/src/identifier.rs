//! Membership identifier parsing.
//!
//! Club members exchange identifiers such as `12345`, `12345C` or `12345Tx4`:
//! a numeric membership number, optionally followed by the member's
//! achievement letter and an endorsement multiplier. The numeric part alone
//! identifies the member; the suffix describes the member's standing when
//! that particular exchange took place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;

/// Achievement letter carried in a membership identifier.
///
/// Ordered by rank so `level >= LevelCode::Tribune` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum LevelCode {
    #[serde(rename = "C")]
    Centurion,
    #[serde(rename = "T")]
    Tribune,
    #[serde(rename = "S")]
    Senator,
}

impl LevelCode {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'C' => Some(LevelCode::Centurion),
            'T' => Some(LevelCode::Tribune),
            'S' => Some(LevelCode::Senator),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            LevelCode::Centurion => 'C',
            LevelCode::Tribune => 'T',
            LevelCode::Senator => 'S',
        }
    }
}

/// A parsed membership identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedIdentifier {
    /// Numeric membership number; the deduplication key for unique-member counts.
    pub base_id: u32,
    pub level: Option<LevelCode>,
    pub multiplier: Option<u32>,
}

impl ParsedIdentifier {
    /// Parse a raw identifier. Only the first whitespace-separated token is
    /// considered, and anything after a recognized suffix is ignored.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let token = raw.split_whitespace().next().ok_or(IdentifierError::Empty)?;

        let digits_end = token
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(token.len());
        if digits_end == 0 {
            return Err(IdentifierError::NoLeadingDigits(raw.to_string()));
        }

        let base_id = token[..digits_end]
            .parse::<u32>()
            .map_err(|_| IdentifierError::BaseOutOfRange(raw.to_string()))?;

        let mut rest = token[digits_end..].chars();
        let level = match rest.next() {
            None => None,
            Some('x') | Some('X') => {
                return Err(IdentifierError::MultiplierWithoutLevel(raw.to_string()))
            }
            Some(letter) => LevelCode::from_letter(letter),
        };

        // Unrecognized letters carry no standing; the base number still counts.
        let Some(level) = level else {
            return Ok(Self {
                base_id,
                level: None,
                multiplier: None,
            });
        };

        let suffix = rest.as_str();
        let multiplier = match suffix.chars().next() {
            Some('x') | Some('X') => Some(parse_multiplier(&suffix[1..], raw)?),
            _ => None,
        };

        Ok(Self {
            base_id,
            level: Some(level),
            multiplier,
        })
    }

    /// Endorsement multiple; an identifier without one counts as x1.
    pub fn multiplier_or_one(&self) -> u32 {
        self.multiplier.unwrap_or(1)
    }

    /// Whether the member's recorded level is one of `levels`.
    /// An empty list admits every member, including those with no letter.
    pub fn level_in(&self, levels: &[LevelCode]) -> bool {
        levels.is_empty() || self.level.is_some_and(|level| levels.contains(&level))
    }
}

fn parse_multiplier(digits: &str, raw: &str) -> Result<u32, IdentifierError> {
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    match digits[..end].parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(IdentifierError::InvalidMultiplier(raw.to_string())),
    }
}

/// Free-function form of [`ParsedIdentifier::parse`].
pub fn parse(raw: &str) -> Result<ParsedIdentifier, IdentifierError> {
    ParsedIdentifier::parse(raw)
}

impl FromStr for ParsedIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ParsedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_id)?;
        if let Some(level) = self.level {
            write!(f, "{}", level.letter())?;
            if let Some(multiplier) = self.multiplier {
                write!(f, "x{}", multiplier)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

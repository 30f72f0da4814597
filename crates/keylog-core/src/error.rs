use thiserror::Error;

use crate::models::{AwardId, Band};

/// Why a raw membership identifier could not be parsed.
///
/// Callers exclude the contact and move on; this never aborts an evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("membership identifier is empty")]
    Empty,

    #[error("no leading digits in membership identifier: {0}")]
    NoLeadingDigits(String),

    #[error("multiplier without achievement letter: {0}")]
    MultiplierWithoutLevel(String),

    #[error("invalid multiplier: {0}")]
    InvalidMultiplier(String),

    #[error("membership number out of range: {0}")]
    BaseOutOfRange(String),
}

/// A structurally invalid rule table. Reported once when the engine is built
/// and disables only the award it belongs to.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleTableError {
    #[error("{award}: {what} must be greater than zero")]
    ZeroThreshold { award: AwardId, what: &'static str },

    #[error("{award}: thresholds must be strictly ascending ({previous} then {next})")]
    NonAscendingThresholds {
        award: AwardId,
        previous: u32,
        next: u32,
    },

    #[error("{award}: endorsement multiples must be strictly ascending ({previous} then {next})")]
    NonAscendingMultiples {
        award: AwardId,
        previous: u32,
        next: u32,
    },

    #[error("{award}: prerequisite multiple x{multiple} is not a defined sub-level")]
    PrerequisiteNotInTable { award: AwardId, multiple: u32 },

    #[error("{award}: sub-level table is empty")]
    EmptySubLevels { award: AwardId },

    #[error("{award}: region catalog is empty")]
    EmptyCatalog { award: AwardId },

    #[error("{award}: region {code} listed more than once")]
    DuplicateRegion { award: AwardId, code: String },

    #[error("{award}: level {level} requires {required} regions but the catalog has {available}")]
    UnreachableLevel {
        award: AwardId,
        level: String,
        required: u32,
        available: usize,
    },

    #[error("{award}: no levels defined")]
    EmptyLevels { award: AwardId },

    #[error("{award}: level {level} defined more than once")]
    DuplicateLevel { award: AwardId, level: String },

    #[error("{award}: point table is empty")]
    EmptyPointTable { award: AwardId },

    #[error("{award}: band {band} has invalid point value {points}")]
    InvalidPoints {
        award: AwardId,
        band: Band,
        points: f64,
    },

    #[error("{award}: {what} must be a positive number of watts")]
    InvalidPowerCeiling { award: AwardId, what: &'static str },

    #[error("{award}: no equipment classes required")]
    EmptyRequiredClasses { award: AwardId },

    #[error("{award}: depends on {prerequisite}, which is misconfigured")]
    PrerequisiteMisconfigured {
        award: AwardId,
        prerequisite: AwardId,
    },
}

impl RuleTableError {
    /// The award this error disables.
    pub fn award(&self) -> AwardId {
        match self {
            RuleTableError::ZeroThreshold { award, .. }
            | RuleTableError::NonAscendingThresholds { award, .. }
            | RuleTableError::NonAscendingMultiples { award, .. }
            | RuleTableError::PrerequisiteNotInTable { award, .. }
            | RuleTableError::EmptySubLevels { award }
            | RuleTableError::EmptyCatalog { award }
            | RuleTableError::DuplicateRegion { award, .. }
            | RuleTableError::UnreachableLevel { award, .. }
            | RuleTableError::EmptyLevels { award }
            | RuleTableError::DuplicateLevel { award, .. }
            | RuleTableError::EmptyPointTable { award }
            | RuleTableError::InvalidPoints { award, .. }
            | RuleTableError::InvalidPowerCeiling { award, .. }
            | RuleTableError::EmptyRequiredClasses { award }
            | RuleTableError::PrerequisiteMisconfigured { award, .. } => *award,
        }
    }
}

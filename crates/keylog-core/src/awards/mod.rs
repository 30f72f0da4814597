//! Award evaluators.
//!
//! Every evaluator follows the same pipeline: project the snapshot through
//! the award's [`ScopeSpec`], reduce the projected contacts, and build an
//! [`AwardProgress`](crate::models::AwardProgress). None of them keep state
//! between calls.
//!
//! - `tiered`: Centurion, Tribune and Senator
//! - `band_points`: QRP x1 and QRP x2
//! - `mpw`: miles per watt
//! - `coverage`: Canadian Maple, Worked All States, Worked All Continents
//! - `key_diversity`: Triple Key
//! - `duration`: Rag Chew
//! - `prefix_points`: PFX
//! - `entities`: DXQ and DXC

pub mod band_points;
pub mod coverage;
pub mod duration;
pub mod entities;
pub mod key_diversity;
pub mod mpw;
pub mod orchestrator;
pub mod prefix_points;
pub mod rules;
pub mod scope;
pub mod tiered;

pub use band_points::{accumulate, BandPointRules, BandTally};
pub use coverage::{coverage, CoverageRules, LevelSpec, RegionEntry, RegionField};
pub use duration::{chew_time, ChewTally, DurationRules};
pub use entities::{entities, EntityCount, EntityRules};
pub use key_diversity::{diversity, Diversity, KeyDiversityRules};
pub use mpw::{qualify, MpwRules};
pub use orchestrator::{evaluate_all, AwardEngine, AwardReport};
pub use prefix_points::{callsign_prefix, prefix_points, PrefixRules};
pub use rules::{RuleTables, RULES_VERSION};
pub use scope::{project, EquipmentRule, ProjectedContact, Projection, RequiredField, ScopeSpec, SpecialCalls};
pub use tiered::{count_members, evaluate_tiers, EndorsementTable, SubLevel, TierRule, TieredRules};

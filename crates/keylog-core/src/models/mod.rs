//! Data models for contacts and award progress.
//!
//! This module contains the data structures shared by the engine and its
//! callers:
//!
//! - `ContactRecord`: a logged contact, read-only input to every evaluator
//! - `Band`, `Mode`, `EquipmentClass`: coded contact fields
//! - `AwardProgress`: per-award output snapshot with its `ProgressDetail`

pub mod contact;
pub mod progress;

pub use contact::{parse_contact_date, parse_contact_time, Band, ContactRecord, EquipmentClass, Mode};
pub use progress::{
    AwardId, AwardProgress, BandMinutes, BandPointsDetail, BandScore, CoverageDetail,
    DurationDetail, Endorsement, EntityDetail, KeyDiversityDetail, LevelProgress, MemberContact,
    PrefixDetail, ProgressDetail, QualifyingContact, TierDetail,
};

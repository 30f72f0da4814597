use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::contact::{Band, EquipmentClass};
use crate::identifier::LevelCode;

// ============================================================================
// Award Identity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AwardId {
    Centurion,
    Tribune,
    Senator,
    QrpX1,
    QrpX2,
    QrpMpw,
    CanadianMaple,
    WorkedAllStates,
    WorkedAllContinents,
    TripleKey,
    RagChew,
    Pfx,
    Dxq,
    Dxc,
}

impl AwardId {
    pub const ALL: [AwardId; 14] = [
        AwardId::Centurion,
        AwardId::Tribune,
        AwardId::Senator,
        AwardId::QrpX1,
        AwardId::QrpX2,
        AwardId::QrpMpw,
        AwardId::CanadianMaple,
        AwardId::WorkedAllStates,
        AwardId::WorkedAllContinents,
        AwardId::TripleKey,
        AwardId::RagChew,
        AwardId::Pfx,
        AwardId::Dxq,
        AwardId::Dxc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AwardId::Centurion => "CENTURION",
            AwardId::Tribune => "TRIBUNE",
            AwardId::Senator => "SENATOR",
            AwardId::QrpX1 => "QRP_X1",
            AwardId::QrpX2 => "QRP_X2",
            AwardId::QrpMpw => "QRP_MPW",
            AwardId::CanadianMaple => "CANADIAN_MAPLE",
            AwardId::WorkedAllStates => "WORKED_ALL_STATES",
            AwardId::WorkedAllContinents => "WORKED_ALL_CONTINENTS",
            AwardId::TripleKey => "TRIPLE_KEY",
            AwardId::RagChew => "RAG_CHEW",
            AwardId::Pfx => "PFX",
            AwardId::Dxq => "DXQ",
            AwardId::Dxc => "DXC",
        }
    }

    /// Part of the Centurion, Tribune, Senator chain.
    pub fn is_tier(&self) -> bool {
        matches!(self, AwardId::Centurion | AwardId::Tribune | AwardId::Senator)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AwardId::Centurion => "Centurion",
            AwardId::Tribune => "Tribune",
            AwardId::Senator => "Senator",
            AwardId::QrpX1 => "QRP x1",
            AwardId::QrpX2 => "QRP x2",
            AwardId::QrpMpw => "QRP Miles Per Watt",
            AwardId::CanadianMaple => "Canadian Maple",
            AwardId::WorkedAllStates => "Worked All States",
            AwardId::WorkedAllContinents => "Worked All Continents",
            AwardId::TripleKey => "Triple Key",
            AwardId::RagChew => "Rag Chew",
            AwardId::Pfx => "PFX",
            AwardId::Dxq => "DX (QSO)",
            AwardId::Dxc => "DX (Country)",
        }
    }
}

impl std::fmt::Display for AwardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Endorsement
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Endorsement {
    /// Number of times the base threshold has been met. `at_least` is set
    /// when the true multiple exceeds the largest displayable one.
    Multiple { multiple: u32, at_least: bool },
    /// Named level of a multi-level award.
    Level { name: String },
}

impl Endorsement {
    pub fn multiple(&self) -> Option<u32> {
        match self {
            Endorsement::Multiple { multiple, .. } => Some(*multiple),
            Endorsement::Level { .. } => None,
        }
    }

    /// Label in the club's usual style, e.g. "Tribune x3" or "Gold Maple".
    pub fn label(&self, award: AwardId) -> String {
        match self {
            Endorsement::Multiple { multiple: 1, at_least: false } => award.display_name().to_string(),
            Endorsement::Multiple { .. } => format!("{} {}", award.display_name(), self),
            Endorsement::Level { name } => name.clone(),
        }
    }
}

impl std::fmt::Display for Endorsement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endorsement::Multiple { multiple, at_least: false } => write!(f, "x{}", multiple),
            Endorsement::Multiple { multiple, at_least: true } => write!(f, "x{}+", multiple),
            Endorsement::Level { name } => f.write_str(name),
        }
    }
}

// ============================================================================
// Award Progress
// ============================================================================

/// Progress toward one award, rebuilt from scratch on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AwardProgress {
    pub award_id: AwardId,
    /// Members, points, qualifying contacts or regions, depending on the award.
    pub current_value: f64,
    pub required_value: f64,
    pub achieved: bool,
    pub endorsement: Option<Endorsement>,
    /// Supplementary, informational data.
    pub detail: ProgressDetail,
}

impl AwardProgress {
    /// Percent complete, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.required_value <= 0.0 {
            return if self.achieved { 100.0 } else { 0.0 };
        }
        (self.current_value / self.required_value * 100.0).min(100.0)
    }

    pub fn remaining(&self) -> f64 {
        (self.required_value - self.current_value).max(0.0)
    }

    pub fn endorsement_label(&self) -> Option<String> {
        self.endorsement.as_ref().map(|e| e.label(self.award_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ProgressDetail {
    Tier(TierDetail),
    BandPoints(BandPointsDetail),
    Qualifying { contacts: Vec<QualifyingContact> },
    Coverage(CoverageDetail),
    KeyDiversity(KeyDiversityDetail),
    Duration(DurationDetail),
    PrefixPoints(PrefixDetail),
    Entities(EntityDetail),
}

// ===== Tiers =====

/// First qualifying contact with a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MemberContact {
    pub base_id: u32,
    pub callsign: String,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub date: Option<NaiveDate>,
    pub band: Option<Band>,
    /// Level recorded on this contact.
    pub level: Option<LevelCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TierDetail {
    pub prerequisite: Option<AwardId>,
    pub prerequisite_met: bool,
    /// Member count needed for the next endorsement; `None` past the last one.
    pub next_target: Option<u32>,
    /// Contacts count only after this date (top tier).
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub counting_after: Option<NaiveDate>,
    /// Combined count checked against the career minimum (top tier).
    pub combined_count: Option<u32>,
    pub combined_required: Option<u32>,
    pub members: Vec<MemberContact>,
}

// ===== Band points =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BandScore {
    pub band: Band,
    pub points: f64,
    /// Callsign of the contact that filled the band.
    pub filled_by: String,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub filled_on: Option<NaiveDate>,
    /// Further qualifying contacts on this band that earned nothing.
    pub ignored: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BandPointsDetail {
    pub bands: Vec<BandScore>,
    pub qualifying_contacts: u32,
}

// ===== Miles per watt =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct QualifyingContact {
    pub callsign: String,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub date: Option<NaiveDate>,
    pub band: Option<Band>,
    pub distance: f64,
    pub tx_power: f64,
    pub ratio: f64,
}

// ===== Regional coverage =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LevelProgress {
    pub level: String,
    pub achieved: bool,
    pub regions_satisfied: u32,
    pub regions_required: u32,
    pub per_region_required: u32,
    /// Contacts per region, capped at `per_region_required`.
    pub region_counts: BTreeMap<String, u32>,
    pub bands_counted: u32,
    pub bands_required: Option<u32>,
    /// For single-band levels, the band with the most satisfied regions.
    pub best_band: Option<Band>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CoverageDetail {
    pub levels: Vec<LevelProgress>,
    /// Highest achieved level, if any.
    pub current_level: Option<String>,
}

impl CoverageDetail {
    pub fn level(&self, name: &str) -> Option<&LevelProgress> {
        self.levels.iter().find(|l| l.level == name)
    }
}

// ===== Key diversity =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct KeyDiversityDetail {
    pub per_class: BTreeMap<EquipmentClass, u32>,
    /// Distinct members worked with each class.
    pub members_per_class: BTreeMap<EquipmentClass, u32>,
    pub missing_classes: Vec<EquipmentClass>,
    pub all_classes_present: bool,
}

// ===== Rag chew =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BandMinutes {
    pub band: Band,
    pub minutes: f64,
    /// Single-band endorsement multiple earned on this band.
    pub multiple: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DurationDetail {
    pub total_minutes: f64,
    pub qualifying_contacts: u32,
    /// Contacts dropped for immediately following one with the same member.
    pub back_to_back_rejected: u32,
    pub next_target: Option<u32>,
    pub bands: Vec<BandMinutes>,
}

// ===== Prefixes =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PrefixDetail {
    /// Highest membership number worked under each prefix.
    pub prefixes: BTreeMap<String, u32>,
    pub unique_prefixes: u32,
    pub next_target: Option<u32>,
}

// ===== DX entities =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EntityDetail {
    /// Distinct members worked in each DXCC entity.
    pub entities: BTreeMap<u32, u32>,
    pub count: u32,
    pub next_target: Option<u32>,
}

// ============================================================================
// Tests
// ============================================================================

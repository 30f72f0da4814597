//! Versioned rule tables for every award, with the club's published values
//! as defaults.
//!
//! Tables are plain data. They are supplied once when the engine is built
//! and never change during an evaluation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::band_points::BandPointRules;
use super::coverage::{CoverageRules, LevelSpec, RegionEntry, RegionField};
use super::duration::DurationRules;
use super::entities::{EntityCount, EntityRules};
use super::key_diversity::KeyDiversityRules;
use super::mpw::MpwRules;
use super::prefix_points::PrefixRules;
use super::scope::{EquipmentRule, RequiredField, ScopeSpec};
use super::tiered::{EndorsementTable, SubLevel, TierRule, TieredRules};
use crate::error::RuleTableError;
use crate::identifier::LevelCode;
use crate::models::{AwardId, Band, EquipmentClass};

/// Bumped whenever a default below changes.
pub const RULES_VERSION: u32 = 4;

const SPECIAL_CALLS: [&str; 2] = ["K9SKC", "K3Y"];

const US_STATES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY",
];

const CANADIAN_PROVINCES: [&str; 10] = ["BC", "AB", "SK", "MB", "ON", "QC", "NB", "NS", "PE", "NL"];

const CANADIAN_TERRITORIES: [&str; 5] = ["YT", "NT", "NU", "VE0", "VY9"];

const CONTINENTS: [&str; 6] = ["NA", "SA", "EU", "AF", "AS", "OC"];

/// HF bands less 60M, for band-diversity levels.
const MAIN_HF: [Band; 9] = [
    Band::M160,
    Band::M80,
    Band::M40,
    Band::M30,
    Band::M20,
    Band::M17,
    Band::M15,
    Band::M12,
    Band::M10,
];

const QRP_WATTS: f64 = 5.0;

const HOME_ENTITY: u32 = 291;

/// Twelve nautical miles, in statute miles.
const TERRITORIAL_LIMIT_MILES: f64 = 13.81;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTables {
    pub version: u32,
    pub tiers: TieredRules,
    pub qrp_x1: BandPointRules,
    pub qrp_x2: BandPointRules,
    pub mpw: MpwRules,
    pub maple: CoverageRules,
    pub was: CoverageRules,
    pub wac: CoverageRules,
    pub triple_key: KeyDiversityRules,
    pub rag_chew: DurationRules,
    pub pfx: PrefixRules,
    pub dxq: EntityRules,
    pub dxc: EntityRules,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            version: RULES_VERSION,
            tiers: default_tiers(),
            qrp_x1: default_qrp(None, 300.0),
            qrp_x2: default_qrp(Some(QRP_WATTS), 150.0),
            mpw: MpwRules {
                scope: ScopeSpec::cw()
                    .require(RequiredField::TxPower)
                    .require(RequiredField::Distance),
                power_ceiling: QRP_WATTS,
                ratio_threshold: 1000.0,
            },
            maple: default_maple(),
            was: default_was(),
            wac: default_wac(),
            triple_key: KeyDiversityRules {
                scope: ScopeSpec::cw()
                    .valid_from(ymd(2018, 11, 10))
                    .require(RequiredField::Membership)
                    .equipment(EquipmentRule::Required(EquipmentClass::MECHANICAL.to_vec())),
                required_classes: EquipmentClass::MECHANICAL.to_vec(),
                threshold: 300,
            },
            rag_chew: DurationRules {
                scope: ScopeSpec::cw()
                    .valid_from(ymd(2013, 7, 1))
                    .require(RequiredField::Membership)
                    .require(RequiredField::Duration)
                    .equipment(EquipmentRule::IfRecorded(EquipmentClass::MECHANICAL.to_vec())),
                min_minutes: 30.0,
                threshold: 300,
                endorsements: EndorsementTable::Stepped { fine_until: 10, step: 5 },
                band_threshold: 300,
            },
            pfx: PrefixRules {
                scope: ScopeSpec::cw()
                    .valid_from(ymd(2013, 1, 1))
                    .require(RequiredField::Membership)
                    .equipment(EquipmentRule::IfRecorded(EquipmentClass::MECHANICAL.to_vec()))
                    .special_calls(&SPECIAL_CALLS, None),
                threshold: 500_000,
                endorsements: EndorsementTable::Stepped { fine_until: 10, step: 5 },
            },
            dxq: default_dx(ymd(2009, 6, 14), EntityCount::MemberPerEntity, "DXQ"),
            dxc: default_dx(ymd(2009, 12, 19), EntityCount::Entity, "DXC"),
        }
    }
}

impl RuleTables {
    /// Parse a JSON override; omitted sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Every award scope, for building a source query that covers them all.
    pub fn scopes(&self) -> Vec<&ScopeSpec> {
        vec![
            &self.tiers.entry.scope,
            &self.tiers.mid.scope,
            &self.tiers.top.scope,
            &self.qrp_x1.scope,
            &self.qrp_x2.scope,
            &self.mpw.scope,
            &self.maple.scope,
            &self.was.scope,
            &self.wac.scope,
            &self.triple_key.scope,
            &self.rag_chew.scope,
            &self.pfx.scope,
            &self.dxq.scope,
            &self.dxc.scope,
        ]
    }

    pub fn validate_tiers(&self) -> Vec<RuleTableError> {
        self.tiers.validate()
    }

    pub fn validate_band_points(&self) -> Vec<RuleTableError> {
        let mut errors = self.qrp_x1.validate(AwardId::QrpX1);
        errors.extend(self.qrp_x2.validate(AwardId::QrpX2));
        errors
    }

    pub fn validate_mpw(&self) -> Vec<RuleTableError> {
        self.mpw.validate(AwardId::QrpMpw)
    }

    pub fn validate_coverage(&self) -> Vec<RuleTableError> {
        let mut errors = self.maple.validate(AwardId::CanadianMaple);
        errors.extend(self.was.validate(AwardId::WorkedAllStates));
        errors.extend(self.wac.validate(AwardId::WorkedAllContinents));
        errors
    }

    pub fn validate_key_diversity(&self) -> Vec<RuleTableError> {
        self.triple_key.validate(AwardId::TripleKey)
    }

    pub fn validate_rag_chew(&self) -> Vec<RuleTableError> {
        self.rag_chew.validate(AwardId::RagChew)
    }

    pub fn validate_pfx(&self) -> Vec<RuleTableError> {
        self.pfx.validate(AwardId::Pfx)
    }

    pub fn validate_dx(&self) -> Vec<RuleTableError> {
        let mut errors = self.dxq.validate(AwardId::Dxq);
        errors.extend(self.dxc.validate(AwardId::Dxc));
        errors
    }

    /// Every structural problem, grouped by the award it disables.
    pub fn validate(&self) -> BTreeMap<AwardId, Vec<RuleTableError>> {
        let mut by_award: BTreeMap<AwardId, Vec<RuleTableError>> = BTreeMap::new();
        let all = self
            .validate_tiers()
            .into_iter()
            .chain(self.validate_band_points())
            .chain(self.validate_mpw())
            .chain(self.validate_coverage())
            .chain(self.validate_key_diversity())
            .chain(self.validate_rag_chew())
            .chain(self.validate_pfx())
            .chain(self.validate_dx());
        for error in all {
            by_award.entry(error.award()).or_default().push(error);
        }
        by_award
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Only called with literal calendar dates below
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn default_tiers() -> TieredRules {
    let mut sub_levels: Vec<SubLevel> = (1..=10)
        .map(|multiple| SubLevel {
            threshold: multiple * 50,
            multiple,
        })
        .collect();
    sub_levels.extend([(750, 15), (1000, 20), (1250, 25), (1500, 30)].map(
        |(threshold, multiple)| SubLevel {
            threshold,
            multiple,
        },
    ));

    TieredRules {
        entry: TierRule {
            scope: ScopeSpec::cw()
                .require(RequiredField::Membership)
                .special_calls(&SPECIAL_CALLS, Some(ymd(2009, 12, 1))),
            qualifying_levels: Vec::new(),
            threshold: 100,
            endorsements: EndorsementTable::Multiples { cap: 40 },
        },
        mid: TierRule {
            scope: ScopeSpec::cw()
                .valid_from(ymd(2007, 3, 1))
                .require(RequiredField::Membership)
                .special_calls(&SPECIAL_CALLS, Some(ymd(2008, 10, 1))),
            qualifying_levels: vec![LevelCode::Centurion, LevelCode::Tribune, LevelCode::Senator],
            threshold: 50,
            endorsements: EndorsementTable::SubLevels { levels: sub_levels },
        },
        top: TierRule {
            scope: ScopeSpec::cw()
                .valid_from(ymd(2013, 8, 1))
                .require(RequiredField::Membership)
                .equipment(EquipmentRule::IfRecorded(EquipmentClass::MECHANICAL.to_vec()))
                .special_calls(&SPECIAL_CALLS, None),
            qualifying_levels: vec![LevelCode::Tribune, LevelCode::Senator],
            threshold: 200,
            endorsements: EndorsementTable::Multiples { cap: 10 },
        },
        top_prerequisite_multiple: 8,
        combined_minimum: 600,
        top_counting_after: None,
    }
}

fn default_qrp(counterpart_ceiling: Option<f64>, threshold: f64) -> BandPointRules {
    let points = BTreeMap::from([
        (Band::M160, 4.0),
        (Band::M80, 3.0),
        (Band::M60, 2.0),
        (Band::M40, 2.0),
        (Band::M30, 2.0),
        (Band::M20, 1.0),
        (Band::M17, 1.0),
        (Band::M15, 1.0),
        (Band::M12, 1.0),
        (Band::M10, 3.0),
        (Band::M6, 0.5),
        (Band::M2, 0.5),
    ]);

    let mut scope = ScopeSpec::cw()
        .require(RequiredField::Band)
        .require(RequiredField::TxPower);
    if counterpart_ceiling.is_some() {
        scope = scope.require(RequiredField::RxPower);
    }

    BandPointRules {
        scope,
        points,
        own_power_ceiling: QRP_WATTS,
        counterpart_power_ceiling: counterpart_ceiling,
        threshold,
    }
}

fn default_maple() -> CoverageRules {
    let catalog = CANADIAN_PROVINCES
        .iter()
        .map(|code| RegionEntry::new(code, Some(ymd(2009, 9, 1))))
        .chain(
            CANADIAN_TERRITORIES
                .iter()
                .map(|code| RegionEntry::new(code, Some(ymd(2014, 1, 1)))),
        )
        .collect();

    CoverageRules {
        field: RegionField::Region,
        catalog,
        scope: ScopeSpec::cw()
            .require(RequiredField::Membership)
            .require(RequiredField::Region)
            .bands(&Band::HF)
            .equipment(EquipmentRule::IfRecorded(EquipmentClass::MECHANICAL.to_vec())),
        levels: vec![
            LevelSpec::new("Yellow", 1, 10),
            LevelSpec::new("Orange", 1, 10).single_band(),
            LevelSpec::new("Red", 10, 10).bands_required(9, &MAIN_HF),
            LevelSpec::new("Gold", 10, 10)
                .bands_required(9, &MAIN_HF)
                .power_ceiling(QRP_WATTS),
        ],
    }
}

fn default_was() -> CoverageRules {
    CoverageRules {
        field: RegionField::Region,
        catalog: US_STATES.iter().map(|code| RegionEntry::new(code, None)).collect(),
        scope: ScopeSpec::cw()
            .require(RequiredField::Membership)
            .require(RequiredField::Region)
            .equipment(EquipmentRule::Required(EquipmentClass::MECHANICAL.to_vec())),
        levels: vec![
            LevelSpec::new("WAS", 1, 50),
            LevelSpec::new("WAS-QRP", 1, 50).power_ceiling(QRP_WATTS),
        ],
    }
}

fn default_wac() -> CoverageRules {
    CoverageRules {
        field: RegionField::Continent,
        catalog: CONTINENTS.iter().map(|code| RegionEntry::new(code, None)).collect(),
        scope: ScopeSpec::cw()
            .valid_from(ymd(2011, 10, 9))
            .require(RequiredField::Membership)
            .require(RequiredField::Continent)
            .equipment(EquipmentRule::Required(EquipmentClass::MECHANICAL.to_vec())),
        levels: vec![
            LevelSpec::new("WAC", 1, 6),
            LevelSpec::new("WAC-QRP", 1, 6).power_ceiling(QRP_WATTS),
        ],
    }
}

fn default_dx(from: NaiveDate, count: EntityCount, label: &str) -> EntityRules {
    EntityRules {
        scope: ScopeSpec::cw()
            .valid_from(from)
            .require(RequiredField::Membership)
            .require(RequiredField::Entity)
            .equipment(EquipmentRule::IfRecorded(EquipmentClass::MECHANICAL.to_vec())),
        count,
        home_entity: HOME_ENTITY,
        maritime_limit: TERRITORIAL_LIMIT_MILES,
        levels: vec![10, 25, 50, 100],
        label: label.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Multi-level geographic coverage awards (Canadian Maple, Worked All
//! States, Worked All Continents).
//!
//! Levels are evaluated independently of each other: an operator can hold a
//! single-band level before finishing the all-band introductory one.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scope::{project, ProjectedContact, ScopeSpec};
use crate::error::RuleTableError;
use crate::models::{
    AwardId, AwardProgress, Band, ContactRecord, CoverageDetail, Endorsement, EquipmentClass,
    LevelProgress, Mode, ProgressDetail,
};

// ============================================================================
// Rule Tables
// ============================================================================

/// Which contact field names the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionField {
    Region,
    Continent,
}

impl RegionField {
    fn read(&self, contact: &ContactRecord) -> Option<String> {
        match self {
            RegionField::Region => contact.normalized_region(),
            RegionField::Continent => contact.normalized_continent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub code: String,
    /// Contacts with this region count from this date (inclusive).
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
}

impl RegionEntry {
    pub fn new(code: &str, valid_from: Option<NaiveDate>) -> Self {
        Self {
            code: code.to_string(),
            valid_from,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub name: String,
    #[serde(default)]
    pub mode: Option<Mode>,
    pub per_region_min: u32,
    pub regions_required: u32,
    /// Distinct bands needed across all contacts used by the level.
    #[serde(default)]
    pub bands_required: Option<u32>,
    /// Bands this level accepts; `None` accepts any band the award scope admits.
    #[serde(default)]
    pub bands: Option<Vec<Band>>,
    #[serde(default)]
    pub power_ceiling: Option<f64>,
    /// Equipment classes that must be recorded for the level.
    #[serde(default)]
    pub equipment: Option<Vec<EquipmentClass>>,
    /// All regions must be worked on one band; the best band is reported.
    #[serde(default)]
    pub single_band: bool,
}

impl LevelSpec {
    pub fn new(name: &str, per_region_min: u32, regions_required: u32) -> Self {
        Self {
            name: name.to_string(),
            mode: None,
            per_region_min,
            regions_required,
            bands_required: None,
            bands: None,
            power_ceiling: None,
            equipment: None,
            single_band: false,
        }
    }

    pub fn bands_required(mut self, count: u32, bands: &[Band]) -> Self {
        self.bands_required = Some(count);
        self.bands = Some(bands.to_vec());
        self
    }

    pub fn power_ceiling(mut self, watts: f64) -> Self {
        self.power_ceiling = Some(watts);
        self
    }

    pub fn single_band(mut self) -> Self {
        self.single_band = true;
        self
    }

    fn admits(&self, contact: &ContactRecord) -> bool {
        if self.mode.is_some_and(|mode| contact.mode != Some(mode)) {
            return false;
        }
        if let Some(bands) = &self.bands {
            if !contact.band.is_some_and(|band| bands.contains(&band)) {
                return false;
            }
        }
        if let Some(ceiling) = self.power_ceiling {
            if !contact.effective_tx_power().is_some_and(|watts| watts <= ceiling) {
                return false;
            }
        }
        if let Some(allowed) = &self.equipment {
            if !contact.equipment_class.is_some_and(|class| allowed.contains(&class)) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRules {
    pub field: RegionField,
    pub catalog: Vec<RegionEntry>,
    pub scope: ScopeSpec,
    /// Ordered from least to most prestigious.
    pub levels: Vec<LevelSpec>,
}

impl CoverageRules {
    pub fn validate(&self, award: AwardId) -> Vec<RuleTableError> {
        let mut errors = Vec::new();

        if self.catalog.is_empty() {
            errors.push(RuleTableError::EmptyCatalog { award });
        }
        let mut codes = HashSet::new();
        for entry in &self.catalog {
            if !codes.insert(entry.code.trim().to_ascii_uppercase()) {
                errors.push(RuleTableError::DuplicateRegion {
                    award,
                    code: entry.code.clone(),
                });
            }
        }

        if self.levels.is_empty() {
            errors.push(RuleTableError::EmptyLevels { award });
        }
        let mut names = HashSet::new();
        for level in &self.levels {
            if !names.insert(level.name.as_str()) {
                errors.push(RuleTableError::DuplicateLevel {
                    award,
                    level: level.name.clone(),
                });
            }
            if level.per_region_min == 0 || level.regions_required == 0 {
                errors.push(RuleTableError::ZeroThreshold {
                    award,
                    what: "per-region and region requirements",
                });
            }
            if level.regions_required as usize > codes.len() {
                errors.push(RuleTableError::UnreachableLevel {
                    award,
                    level: level.name.clone(),
                    required: level.regions_required,
                    available: codes.len(),
                });
            }
            if level.bands_required == Some(0) {
                errors.push(RuleTableError::ZeroThreshold {
                    award,
                    what: "band requirement",
                });
            }
            if level
                .power_ceiling
                .is_some_and(|watts| !(watts.is_finite() && watts > 0.0))
            {
                errors.push(RuleTableError::InvalidPowerCeiling {
                    award,
                    what: "level power ceiling",
                });
            }
        }

        errors
    }

    /// Catalog region for a contact, honoring each region's validity date.
    fn region_of(&self, contact: &ContactRecord) -> Option<String> {
        let code = self.field.read(contact)?;
        let entry = self.catalog.iter().find(|e| e.code.eq_ignore_ascii_case(&code))?;
        if let Some(from) = entry.valid_from {
            if !contact.date.is_some_and(|date| date >= from) {
                return None;
            }
        }
        Some(entry.code.to_ascii_uppercase())
    }
}

// ============================================================================
// Tracker
// ============================================================================

struct Tally {
    region_counts: BTreeMap<String, u32>,
    bands: BTreeSet<Band>,
}

impl Tally {
    fn new() -> Self {
        Self {
            region_counts: BTreeMap::new(),
            bands: BTreeSet::new(),
        }
    }

    fn add(&mut self, region: String, band: Option<Band>, cap: u32) {
        let count = self.region_counts.entry(region).or_insert(0);
        // Extra contacts in a satisfied region do not inflate progress
        *count = (*count + 1).min(cap);
        if let Some(band) = band {
            self.bands.insert(band);
        }
    }

    fn satisfied(&self, cap: u32) -> u32 {
        self.region_counts.values().filter(|n| **n >= cap).count() as u32
    }
}

fn level_progress(
    level: &LevelSpec,
    tally: Tally,
    best_band: Option<Band>,
) -> LevelProgress {
    let regions_satisfied = tally.satisfied(level.per_region_min);
    let bands_counted = if level.single_band {
        u32::from(best_band.is_some())
    } else {
        tally.bands.len() as u32
    };
    let achieved = regions_satisfied >= level.regions_required
        && level.bands_required.map_or(true, |needed| bands_counted >= needed);

    LevelProgress {
        level: level.name.clone(),
        achieved,
        regions_satisfied,
        regions_required: level.regions_required,
        per_region_required: level.per_region_min,
        region_counts: tally.region_counts,
        bands_counted,
        bands_required: level.bands_required,
        best_band,
    }
}

/// Progress for every level, in the order the levels are defined.
pub fn coverage<'a>(
    contacts: impl IntoIterator<Item = ProjectedContact<'a>>,
    rules: &CoverageRules,
) -> Vec<LevelProgress> {
    let located: Vec<(&ContactRecord, String)> = contacts
        .into_iter()
        .filter_map(|contact| {
            let region = rules.region_of(contact.record)?;
            Some((contact.record, region))
        })
        .collect();

    rules
        .levels
        .iter()
        .map(|level| {
            let used = located.iter().filter(|(contact, _)| level.admits(contact));

            if !level.single_band {
                let mut tally = Tally::new();
                for (contact, region) in used {
                    tally.add(region.clone(), contact.band, level.per_region_min);
                }
                return level_progress(level, tally, None);
            }

            let mut per_band: BTreeMap<Band, Tally> = BTreeMap::new();
            for (contact, region) in used {
                let Some(band) = contact.band else {
                    continue;
                };
                per_band
                    .entry(band)
                    .or_insert_with(Tally::new)
                    .add(region.clone(), Some(band), level.per_region_min);
            }

            // Most satisfied regions wins; ties go to the lower band
            let mut best: Option<(Band, Tally)> = None;
            for (band, tally) in per_band {
                let better = best.as_ref().map_or(true, |(_, current)| {
                    tally.satisfied(level.per_region_min) > current.satisfied(level.per_region_min)
                });
                if better {
                    best = Some((band, tally));
                }
            }
            match best {
                Some((band, tally)) => level_progress(level, tally, Some(band)),
                None => level_progress(level, Tally::new(), None),
            }
        })
        .collect()
}

pub fn evaluate(award: AwardId, contacts: &[ContactRecord], rules: &CoverageRules) -> AwardProgress {
    let levels = coverage(project(contacts, &rules.scope), rules);

    let current_level = levels
        .iter()
        .rev()
        .find(|level| level.achieved)
        .map(|level| level.level.clone());

    // Headline numbers track the first level still open
    let headline = levels
        .iter()
        .find(|level| !level.achieved)
        .or_else(|| levels.last());
    let (current_value, required_value) = headline
        .map(|level| (level.regions_satisfied as f64, level.regions_required as f64))
        .unwrap_or((0.0, 0.0));

    debug!(award = %award, ?current_level, "Evaluated coverage");

    AwardProgress {
        award_id: award,
        current_value,
        required_value,
        achieved: current_level.is_some(),
        endorsement: current_level
            .clone()
            .map(|name| Endorsement::Level { name }),
        detail: ProgressDetail::Coverage(CoverageDetail {
            levels,
            current_level,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awards::rules::RuleTables;

    const PROVINCES: [&str; 10] = ["BC", "AB", "SK", "MB", "ON", "QC", "NB", "NS", "PE", "NL"];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ve(region: &str, band: Band) -> ContactRecord {
        ContactRecord::new("VE3ABC")
            .with_mode(Mode::Cw)
            .with_band(band)
            .with_date(date(2020, 1, 1))
            .with_membership("555")
            .with_region(region)
    }

    fn maple() -> CoverageRules {
        RuleTables::default().maple
    }

    fn detail(progress: &AwardProgress) -> &CoverageDetail {
        match &progress.detail {
            ProgressDetail::Coverage(detail) => detail,
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_ten_regions_achieves_first_level() {
        let contacts: Vec<_> = PROVINCES.iter().map(|p| ve(p, Band::M40)).collect();
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        let d = detail(&progress);
        assert!(d.level("Yellow").unwrap().achieved);
        assert!(progress.achieved);
    }

    #[test]
    fn test_nine_regions_not_achieved() {
        let contacts: Vec<_> = PROVINCES[..9].iter().map(|p| ve(p, Band::M20)).collect();
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        let yellow = detail(&progress).level("Yellow").unwrap();
        assert_eq!(yellow.regions_satisfied, 9);
        assert!(!yellow.achieved);
        assert!(!progress.achieved);
        assert_eq!(progress.endorsement, None);
        assert_eq!(progress.current_value, 9.0);
        assert_eq!(progress.required_value, 10.0);
    }

    #[test]
    fn test_unknown_region_excluded() {
        let contacts = vec![ve("ZZ", Band::M40), ve("TX", Band::M40), ve("on", Band::M40)];
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        let yellow = detail(&progress).level("Yellow").unwrap();
        assert_eq!(yellow.region_counts.keys().collect::<Vec<_>>(), vec!["ON"]);
    }

    #[test]
    fn test_region_validity_dates() {
        let contacts = vec![
            ve("ON", Band::M40).with_date(date(2009, 8, 31)),
            ve("QC", Band::M40).with_date(date(2009, 9, 1)),
            ve("YT", Band::M40).with_date(date(2013, 12, 31)),
            ve("NU", Band::M40).with_date(date(2014, 1, 1)),
        ];
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        let yellow = detail(&progress).level("Yellow").unwrap();
        assert_eq!(yellow.region_counts.keys().collect::<Vec<_>>(), vec!["NU", "QC"]);
    }

    #[test]
    fn test_per_region_count_capped() {
        let contacts: Vec<_> = (0..25).map(|_| ve("ON", Band::M40)).collect();
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        let d = detail(&progress);
        assert_eq!(d.level("Yellow").unwrap().region_counts["ON"], 1);
        assert_eq!(d.level("Red").unwrap().region_counts["ON"], 10);
    }

    #[test]
    fn test_single_band_level_reports_best_band() {
        let mut contacts: Vec<_> = PROVINCES.iter().map(|p| ve(p, Band::M20)).collect();
        contacts.extend(PROVINCES[..4].iter().map(|p| ve(p, Band::M40)));
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        let orange = detail(&progress).level("Orange").unwrap();
        assert!(orange.achieved);
        assert_eq!(orange.best_band, Some(Band::M20));
        assert_eq!(detail(&progress).current_level.as_deref(), Some("Orange"));
    }

    #[test]
    fn test_levels_independent_of_order() {
        // Nine provinces on one band: neither level is achieved
        let contacts: Vec<_> = PROVINCES[..9].iter().map(|p| ve(p, Band::M40)).collect();
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        assert!(detail(&progress).levels.iter().all(|l| !l.achieved));

        // A level's outcome never depends on an earlier one
        let mut rules = maple();
        rules.levels.retain(|l| l.name != "Yellow");
        let contacts: Vec<_> = PROVINCES.iter().map(|p| ve(p, Band::M40)).collect();
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &rules);
        assert_eq!(detail(&progress).current_level.as_deref(), Some("Orange"));
    }

    #[test]
    fn test_band_diversity_requirement() {
        let bands = [
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
        let mut contacts = Vec::new();
        for province in PROVINCES {
            for (i, band) in bands.iter().cycle().take(10).enumerate() {
                contacts.push(ve(province, *band).with_tx_power(if i % 2 == 0 { 5.0 } else { 100.0 }));
            }
        }
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        let d = detail(&progress);
        let red = d.level("Red").unwrap();
        assert_eq!(red.bands_counted, 9);
        assert!(red.achieved);
        // Only half the contacts are QRP: 5 per province
        let gold = d.level("Gold").unwrap();
        assert_eq!(gold.regions_satisfied, 0);
        assert!(!gold.achieved);
        assert_eq!(d.current_level.as_deref(), Some("Red"));
        assert_eq!(
            progress.endorsement,
            Some(Endorsement::Level { name: "Red".to_string() })
        );
        // Headline tracks Gold, the first level still open
        assert_eq!(progress.current_value, 0.0);
    }

    #[test]
    fn test_sixty_meters_not_counted_for_band_diversity() {
        let contacts: Vec<_> = PROVINCES.iter().map(|p| ve(p, Band::M60)).collect();
        let progress = evaluate(AwardId::CanadianMaple, &contacts, &maple());
        let d = detail(&progress);
        assert!(d.level("Yellow").unwrap().achieved);
        assert_eq!(d.level("Red").unwrap().bands_counted, 0);
    }

    #[test]
    fn test_continent_field() {
        let rules = RuleTables::default().wac;
        let contacts: Vec<_> = ["NA", "SA", "EU", "AF", "AS", "OC"]
            .iter()
            .map(|c| {
                ContactRecord::new("DL1AA")
                    .with_mode(Mode::Cw)
                    .with_band(Band::M20)
                    .with_date(date(2020, 1, 1))
                    .with_membership("42")
                    .with_equipment(EquipmentClass::Straight)
                    .with_continent(*c)
            })
            .collect();
        let progress = evaluate(AwardId::WorkedAllContinents, &contacts, &rules);
        assert!(progress.achieved);
        assert_eq!(detail(&progress).current_level.as_deref(), Some("WAC"));
    }

    #[test]
    fn test_validate_catalog_problems() {
        let mut rules = maple();
        rules.catalog.push(RegionEntry::new("on", None));
        rules.levels.push(LevelSpec::new("Yellow", 1, 10));
        rules.levels.push(LevelSpec::new("Platinum", 1, 99));
        let errors = rules.validate(AwardId::CanadianMaple);
        assert!(errors.iter().any(|e| matches!(e, RuleTableError::DuplicateRegion { .. })));
        assert!(errors.iter().any(|e| matches!(e, RuleTableError::DuplicateLevel { .. })));
        assert!(errors.iter().any(|e| matches!(e, RuleTableError::UnreachableLevel { required: 99, .. })));
        assert!(maple().validate(AwardId::CanadianMaple).is_empty());
    }
}

//! Runs every award over one contact snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::rules::RuleTables;
use super::{band_points, coverage, duration, entities, key_diversity, mpw, prefix_points, tiered};
use crate::models::{AwardId, AwardProgress, ContactRecord};
use crate::source::{ContactQuery, ContactSource};

/// Result of one evaluation. Carries no timestamps, so evaluating the same
/// snapshot twice yields equal reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AwardReport {
    pub rules_version: u32,
    pub awards: BTreeMap<AwardId, AwardProgress>,
    /// Awards skipped because their rule table is invalid, with the reason.
    pub misconfigured: BTreeMap<AwardId, String>,
}

impl AwardReport {
    pub fn get(&self, award: AwardId) -> Option<&AwardProgress> {
        self.awards.get(&award)
    }

    pub fn achieved(&self) -> impl Iterator<Item = &AwardProgress> {
        self.awards.values().filter(|p| p.achieved)
    }
}

/// Validated rule tables, ready to evaluate snapshots.
///
/// Holds no per-evaluation state; one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct AwardEngine {
    rules: RuleTables,
    misconfigured: BTreeMap<AwardId, String>,
}

impl AwardEngine {
    pub fn new(rules: RuleTables) -> Self {
        let misconfigured: BTreeMap<AwardId, String> = rules
            .validate()
            .into_iter()
            .map(|(award, errors)| {
                let reason = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                error!(award = %award, reason = %reason, "Rule table rejected, award disabled");
                (award, reason)
            })
            .collect();

        info!(
            version = rules.version,
            enabled = AwardId::ALL.len() - misconfigured.len(),
            "Award engine ready"
        );

        Self {
            rules,
            misconfigured,
        }
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    pub fn misconfigured(&self) -> &BTreeMap<AwardId, String> {
        &self.misconfigured
    }

    pub fn is_enabled(&self, award: AwardId) -> bool {
        !self.misconfigured.contains_key(&award)
    }

    /// Progress for one award, or `None` if it is disabled.
    pub fn evaluate(&self, award: AwardId, contacts: &[ContactRecord]) -> Option<AwardProgress> {
        if !self.is_enabled(award) {
            return None;
        }
        let rules = &self.rules;
        let progress = match award {
            AwardId::Centurion | AwardId::Tribune | AwardId::Senator => {
                let [entry, mid, top] = tiered::evaluate_tiers(contacts, &rules.tiers);
                match award {
                    AwardId::Centurion => entry,
                    AwardId::Tribune => mid,
                    _ => top,
                }
            }
            AwardId::QrpX1 => band_points::evaluate(award, contacts, &rules.qrp_x1),
            AwardId::QrpX2 => band_points::evaluate(award, contacts, &rules.qrp_x2),
            AwardId::QrpMpw => mpw::evaluate(contacts, &rules.mpw),
            AwardId::CanadianMaple => coverage::evaluate(award, contacts, &rules.maple),
            AwardId::WorkedAllStates => coverage::evaluate(award, contacts, &rules.was),
            AwardId::WorkedAllContinents => coverage::evaluate(award, contacts, &rules.wac),
            AwardId::TripleKey => key_diversity::evaluate(contacts, &rules.triple_key),
            AwardId::RagChew => duration::evaluate(contacts, &rules.rag_chew),
            AwardId::Pfx => prefix_points::evaluate(contacts, &rules.pfx),
            AwardId::Dxq => entities::evaluate(award, contacts, &rules.dxq),
            AwardId::Dxc => entities::evaluate(award, contacts, &rules.dxc),
        };
        Some(progress)
    }

    /// Progress for every enabled award. Never fails; an empty snapshot
    /// yields zero progress everywhere.
    pub fn evaluate_all(&self, contacts: &[ContactRecord]) -> AwardReport {
        let mut awards = BTreeMap::new();

        // The tier chain is computed once and split
        if self.is_enabled(AwardId::Centurion) {
            let tiers = tiered::evaluate_tiers(contacts, &self.rules.tiers);
            for progress in tiers {
                if self.is_enabled(progress.award_id) {
                    awards.insert(progress.award_id, progress);
                }
            }
        }

        for award in AwardId::ALL.into_iter().filter(|a| !a.is_tier()) {
            if let Some(progress) = self.evaluate(award, contacts) {
                awards.insert(award, progress);
            }
        }

        AwardReport {
            rules_version: self.rules.version,
            awards,
            misconfigured: self.misconfigured.clone(),
        }
    }

    /// Query `source` for every contact any award could use, then evaluate.
    pub fn evaluate_source<S>(&self, source: &S) -> Result<AwardReport, S::Error>
    where
        S: ContactSource + ?Sized,
    {
        let query = ContactQuery::for_rules(&self.rules);
        let contacts = source.query(&query)?;
        Ok(self.evaluate_all(&contacts))
    }
}

/// One-shot evaluation with `rules`.
pub fn evaluate_all(contacts: &[ContactRecord], rules: &RuleTables) -> AwardReport {
    AwardEngine::new(rules.clone()).evaluate_all(contacts)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Band, Mode};

    #[test]
    fn test_empty_snapshot_reports_every_award() {
        let report = evaluate_all(&[], &RuleTables::default());
        assert_eq!(report.awards.len(), AwardId::ALL.len());
        assert!(report.misconfigured.is_empty());
        for progress in report.awards.values() {
            assert_eq!(progress.current_value, 0.0, "{}", progress.award_id);
            assert!(progress.current_value.is_sign_positive(), "{}", progress.award_id);
            assert!(!progress.achieved);
            assert_eq!(progress.endorsement, None);
        }
    }

    #[test]
    fn test_broken_table_disables_only_its_award() {
        let mut rules = RuleTables::default();
        rules.qrp_x2.points.clear();
        let engine = AwardEngine::new(rules);
        assert!(!engine.is_enabled(AwardId::QrpX2));
        let report = engine.evaluate_all(&[]);
        assert!(report.get(AwardId::QrpX2).is_none());
        assert!(report.misconfigured[&AwardId::QrpX2].contains("point table is empty"));
        assert_eq!(report.awards.len(), AwardId::ALL.len() - 1);
    }

    #[test]
    fn test_broken_mid_tier_keeps_entry() {
        let mut rules = RuleTables::default();
        rules.tiers.mid.threshold = 0;
        let report = evaluate_all(&[], &rules);
        assert!(report.get(AwardId::Centurion).is_some());
        assert!(report.get(AwardId::Tribune).is_none());
        assert!(report.get(AwardId::Senator).is_none());
    }

    #[test]
    fn test_single_award_matches_full_run() {
        let contacts: Vec<_> = (1..=5)
            .map(|n| {
                ContactRecord::new(format!("N{}", n))
                    .with_mode(Mode::Cw)
                    .with_band(Band::M20)
                    .with_membership(format!("{}T", n))
            })
            .collect();
        let engine = AwardEngine::new(RuleTables::default());
        let report = engine.evaluate_all(&contacts);
        assert_eq!(
            engine.evaluate(AwardId::Centurion, &contacts).as_ref(),
            report.get(AwardId::Centurion)
        );
    }

    #[test]
    fn test_evaluate_from_source() {
        let contacts = vec![ContactRecord::new("K1A")
            .with_mode(Mode::Cw)
            .with_membership("12")];
        let engine = AwardEngine::new(RuleTables::default());
        let report = engine.evaluate_source(contacts.as_slice()).unwrap();
        assert_eq!(report.get(AwardId::Centurion).map(|p| p.current_value), Some(1.0));
    }
}

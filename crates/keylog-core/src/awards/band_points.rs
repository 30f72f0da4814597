//! Band-scored point awards (QRP x1 and QRP x2).
//!
//! Each band contributes its table value at most once, however many
//! qualifying contacts were made on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scope::{project, ProjectedContact, ScopeSpec};
use crate::error::RuleTableError;
use crate::models::{
    AwardId, AwardProgress, Band, BandPointsDetail, BandScore, ContactRecord, ProgressDetail,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPointRules {
    pub scope: ScopeSpec,
    pub points: BTreeMap<Band, f64>,
    /// Maximum own transmit power in watts.
    pub own_power_ceiling: f64,
    /// Maximum counterpart power in watts, for two-sided variants.
    #[serde(default)]
    pub counterpart_power_ceiling: Option<f64>,
    pub threshold: f64,
}

impl BandPointRules {
    pub fn validate(&self, award: AwardId) -> Vec<RuleTableError> {
        let mut errors = Vec::new();
        if self.points.is_empty() {
            errors.push(RuleTableError::EmptyPointTable { award });
        }
        for (band, points) in &self.points {
            if !points.is_finite() || *points <= 0.0 {
                errors.push(RuleTableError::InvalidPoints {
                    award,
                    band: *band,
                    points: *points,
                });
            }
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "point threshold",
            });
        }
        if !(self.own_power_ceiling.is_finite() && self.own_power_ceiling > 0.0) {
            errors.push(RuleTableError::InvalidPowerCeiling {
                award,
                what: "own power ceiling",
            });
        }
        if self
            .counterpart_power_ceiling
            .is_some_and(|ceiling| !(ceiling.is_finite() && ceiling > 0.0))
        {
            errors.push(RuleTableError::InvalidPowerCeiling {
                award,
                what: "counterpart power ceiling",
            });
        }
        errors
    }

    /// Power check applied to every contact before the band cap.
    pub fn power_qualifies(&self, contact: &ContactRecord) -> bool {
        let own_ok = contact
            .effective_tx_power()
            .is_some_and(|watts| watts <= self.own_power_ceiling);
        let counterpart_ok = match self.counterpart_power_ceiling {
            None => true,
            Some(ceiling) => contact.effective_rx_power().is_some_and(|watts| watts <= ceiling),
        };
        own_ok && counterpart_ok
    }
}

/// Capped point total with its per-band breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTally {
    pub total: f64,
    pub bands: Vec<BandScore>,
    pub qualifying_contacts: u32,
}

/// Sum band points over the contacts passing `predicate`, one contact per band.
///
/// The first contact seen on a band fills it; later ones are counted as
/// ignored. Contacts on bands missing from `points` are skipped.
pub fn accumulate<'a, F>(
    contacts: impl IntoIterator<Item = ProjectedContact<'a>>,
    points: &BTreeMap<Band, f64>,
    predicate: F,
) -> BandTally
where
    F: Fn(&ContactRecord) -> bool,
{
    let mut filled: BTreeMap<Band, BandScore> = BTreeMap::new();
    let mut qualifying_contacts = 0;

    for contact in contacts {
        if !predicate(contact.record) {
            continue;
        }
        let Some(band) = contact.band() else {
            continue;
        };
        let Some(&value) = points.get(&band) else {
            continue;
        };
        qualifying_contacts += 1;

        filled
            .entry(band)
            .and_modify(|score| score.ignored += 1)
            .or_insert_with(|| BandScore {
                band,
                points: value,
                filled_by: contact.callsign().to_string(),
                filled_on: contact.date(),
                ignored: 0,
            });
    }

    // Summed in band order so the total never depends on contact order
    let total = filled.values().fold(0.0, |acc, score| acc + score.points);

    BandTally {
        total,
        bands: filled.into_values().collect(),
        qualifying_contacts,
    }
}

pub fn evaluate(award: AwardId, contacts: &[ContactRecord], rules: &BandPointRules) -> AwardProgress {
    let tally = accumulate(project(contacts, &rules.scope), &rules.points, |c| {
        rules.power_qualifies(c)
    });
    let achieved = tally.total >= rules.threshold;

    debug!(
        award = %award,
        total = tally.total,
        bands = tally.bands.len(),
        achieved,
        "Evaluated band points"
    );

    AwardProgress {
        award_id: award,
        current_value: tally.total,
        required_value: rules.threshold,
        achieved,
        endorsement: None,
        detail: ProgressDetail::BandPoints(BandPointsDetail {
            bands: tally.bands,
            qualifying_contacts: tally.qualifying_contacts,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

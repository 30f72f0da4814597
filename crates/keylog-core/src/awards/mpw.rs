//! Miles-per-watt qualification. Every qualifying contact is listed on its
//! own; there is no band cap and no deduplication.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scope::{project, ProjectedContact, ScopeSpec};
use crate::error::RuleTableError;
use crate::models::{AwardId, AwardProgress, ContactRecord, ProgressDetail, QualifyingContact};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpwRules {
    pub scope: ScopeSpec,
    /// Maximum transmit power in watts.
    pub power_ceiling: f64,
    /// Minimum miles per watt.
    pub ratio_threshold: f64,
}

impl MpwRules {
    pub fn validate(&self, award: AwardId) -> Vec<RuleTableError> {
        let mut errors = Vec::new();
        if !(self.power_ceiling.is_finite() && self.power_ceiling > 0.0) {
            errors.push(RuleTableError::InvalidPowerCeiling {
                award,
                what: "power ceiling",
            });
        }
        if !(self.ratio_threshold.is_finite() && self.ratio_threshold > 0.0) {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "miles-per-watt threshold",
            });
        }
        errors
    }

    /// Ratio for one contact, if it qualifies.
    pub fn ratio(&self, contact: &ContactRecord) -> Option<f64> {
        // effective_* only yields finite positive values, so the division is safe
        let power = contact.effective_tx_power()?;
        let distance = contact.effective_distance()?;
        if power > self.power_ceiling {
            return None;
        }
        let ratio = distance / power;
        (ratio >= self.ratio_threshold).then_some(ratio)
    }
}

/// Every projected contact meeting the miles-per-watt threshold.
pub fn qualify<'a>(
    contacts: impl IntoIterator<Item = ProjectedContact<'a>>,
    rules: &MpwRules,
) -> Vec<QualifyingContact> {
    contacts
        .into_iter()
        .filter_map(|contact| {
            let ratio = rules.ratio(contact.record)?;
            Some(QualifyingContact {
                callsign: contact.callsign().to_string(),
                date: contact.date(),
                band: contact.band(),
                distance: contact.record.effective_distance()?,
                tx_power: contact.record.effective_tx_power()?,
                ratio,
            })
        })
        .collect()
}

pub fn evaluate(contacts: &[ContactRecord], rules: &MpwRules) -> AwardProgress {
    let qualifying = qualify(project(contacts, &rules.scope), rules);
    let count = qualifying.len();

    debug!(qualifying = count, "Evaluated miles per watt");

    AwardProgress {
        award_id: AwardId::QrpMpw,
        current_value: count as f64,
        required_value: 1.0,
        achieved: count > 0,
        endorsement: None,
        detail: ProgressDetail::Qualifying {
            contacts: qualifying,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awards::rules::RuleTables;
    use crate::models::Mode;

    fn contact(distance: f64, power: f64) -> ContactRecord {
        ContactRecord::new("JA1XYZ")
            .with_mode(Mode::Cw)
            .with_distance(distance)
            .with_tx_power(power)
    }

    fn rules() -> MpwRules {
        RuleTables::default().mpw
    }

    #[test]
    fn test_ratio_boundaries() {
        let rules = rules();
        assert_eq!(rules.ratio(&contact(500.0, 0.5)), Some(1000.0));
        assert_eq!(rules.ratio(&contact(2500.0, 5.0)), None);
        assert_eq!(rules.ratio(&contact(999.0, 1.0)), None);
    }

    #[test]
    fn test_zero_or_missing_power_never_qualifies() {
        let rules = rules();
        assert_eq!(rules.ratio(&contact(1_000_000.0, 0.0)), None);
        assert_eq!(rules.ratio(&contact(1_000_000.0, -1.0)), None);
        assert_eq!(rules.ratio(&ContactRecord::new("K1A").with_distance(5000.0)), None);
    }

    #[test]
    fn test_power_above_ceiling() {
        assert_eq!(rules().ratio(&contact(60_000.0, 6.0)), None);
    }

    #[test]
    fn test_every_qualifying_contact_listed() {
        let contacts = vec![
            contact(5000.0, 1.0),
            contact(5000.0, 1.0),
            contact(100.0, 1.0),
            contact(5000.0, 1.0).with_mode(Mode::Ssb),
        ];
        let progress = evaluate(&contacts, &rules());
        assert_eq!(progress.current_value, 2.0);
        assert!(progress.achieved);
        let ProgressDetail::Qualifying { contacts } = &progress.detail else {
            panic!("wrong detail");
        };
        assert_eq!(contacts[0].ratio, 5000.0);
    }

    #[test]
    fn test_empty_collection() {
        let progress = evaluate(&[], &rules());
        assert_eq!(progress.current_value, 0.0);
        assert!(!progress.achieved);
    }
}

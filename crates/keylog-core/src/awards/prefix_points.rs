//! Prefix points (PFX): each distinct callsign prefix scores the highest
//! membership number worked under it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scope::{project, ProjectedContact, ScopeSpec};
use super::tiered::EndorsementTable;
use crate::error::RuleTableError;
use crate::models::{
    AwardId, AwardProgress, ContactRecord, Endorsement, PrefixDetail, ProgressDetail,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixRules {
    pub scope: ScopeSpec,
    /// Points for the base award.
    pub threshold: u32,
    pub endorsements: EndorsementTable,
}

impl PrefixRules {
    pub fn validate(&self, award: AwardId) -> Vec<RuleTableError> {
        let mut errors = Vec::new();
        if self.threshold == 0 {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "threshold",
            });
        }
        self.endorsements.validate(award, &mut errors);
        errors
    }
}

/// Prefix of a callsign: its leading letters and digits, up to and
/// including the last digit. Portable designators are dropped, so
/// `DU3/W5LFA` and `K5ZMD/7` give `W5` and `K5`.
pub fn callsign_prefix(callsign: &str) -> Option<String> {
    let callsign = callsign.trim().to_ascii_uppercase();
    let home = callsign
        .split('/')
        .filter(|part| part.chars().any(|c| c.is_ascii_digit()))
        .fold(None::<&str>, |best, part| match best {
            Some(b) if b.len() >= part.len() => Some(b),
            _ => Some(part),
        })?;

    let leading: String = home.chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
    let end = leading.rfind(|c: char| c.is_ascii_digit())?;
    Some(leading[..=end].to_string())
}

/// Highest membership number per prefix.
pub fn prefix_points<'a>(
    contacts: impl IntoIterator<Item = ProjectedContact<'a>>,
) -> BTreeMap<String, u32> {
    let mut best: BTreeMap<String, u32> = BTreeMap::new();
    for contact in contacts {
        let Some(base_id) = contact.base_id() else {
            continue;
        };
        let Some(prefix) = callsign_prefix(contact.callsign()) else {
            continue;
        };
        let entry = best.entry(prefix).or_insert(0);
        *entry = (*entry).max(base_id);
    }
    best
}

pub fn evaluate(contacts: &[ContactRecord], rules: &PrefixRules) -> AwardProgress {
    let prefixes = prefix_points(project(contacts, &rules.scope));
    let total: u64 = prefixes.values().map(|n| u64::from(*n)).sum();
    let points = u32::try_from(total).unwrap_or(u32::MAX);
    let achieved = points >= rules.threshold;
    let (multiple, at_least) = rules.endorsements.multiple_for(points, rules.threshold);

    debug!(points = total, prefixes = prefixes.len(), "Evaluated prefix points");

    AwardProgress {
        award_id: AwardId::Pfx,
        current_value: total as f64,
        required_value: rules.threshold as f64,
        achieved,
        endorsement: (achieved && multiple > 0)
            .then_some(Endorsement::Multiple { multiple, at_least }),
        detail: ProgressDetail::PrefixPoints(PrefixDetail {
            unique_prefixes: prefixes.len() as u32,
            next_target: rules.endorsements.next_target(points, rules.threshold),
            prefixes,
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
    use crate::models::{Band, Mode};
    use chrono::NaiveDate;

    fn worked(call: &str, member: &str) -> ContactRecord {
        ContactRecord::new(call)
            .with_mode(Mode::Cw)
            .with_band(Band::M20)
            .with_date(NaiveDate::from_ymd_opt(2021, 3, 3).unwrap())
            .with_membership(member)
    }

    fn rules() -> PrefixRules {
        RuleTables::default().pfx
    }

    #[test]
    fn test_callsign_prefix_forms() {
        assert_eq!(callsign_prefix("AC2C").as_deref(), Some("AC2"));
        assert_eq!(callsign_prefix("n6wk").as_deref(), Some("N6"));
        assert_eq!(callsign_prefix("2D0YLX").as_deref(), Some("2D0"));
        assert_eq!(callsign_prefix("S51AF").as_deref(), Some("S51"));
        assert_eq!(callsign_prefix("DU3/W5LFA").as_deref(), Some("W5"));
        assert_eq!(callsign_prefix("K5ZMD/7").as_deref(), Some("K5"));
        assert_eq!(callsign_prefix("NOCALL"), None);
        assert_eq!(callsign_prefix(""), None);
    }

    #[test]
    fn test_highest_number_per_prefix() {
        let contacts = vec![
            worked("W1AW", "1200"),
            worked("W1XYZ", "15000S"),
            worked("K2ABC", "300"),
            worked("W1QQ", "900T"),
        ];
        let progress = evaluate(&contacts, &rules());
        assert_eq!(progress.current_value, 15300.0);
        let ProgressDetail::PrefixPoints(detail) = &progress.detail else {
            panic!("wrong detail");
        };
        assert_eq!(detail.unique_prefixes, 2);
        assert_eq!(detail.prefixes["W1"], 15000);
        assert_eq!(detail.next_target, Some(500_000));
    }

    #[test]
    fn test_base_award_and_endorsement_steps() {
        // 50 prefixes at 10,000 each
        let contacts: Vec<_> = (0..50)
            .map(|n| worked(&format!("K{}A{}", n, n), &format!("{}", 10_000 + n)))
            .collect();
        let progress = evaluate(&contacts, &rules());
        assert!(progress.achieved);
        assert_eq!(progress.endorsement.as_ref().and_then(|e| e.multiple()), Some(1));

        let big: Vec<_> = (0..400)
            .map(|n| worked(&format!("N{}B", n), "20000"))
            .collect();
        // 8,000,000 points: x16 rounds down to the x15 step
        let progress = evaluate(&big, &rules());
        assert_eq!(progress.endorsement.as_ref().and_then(|e| e.multiple()), Some(15));
    }

    #[test]
    fn test_special_calls_and_non_members_ignored() {
        let contacts = vec![
            worked("K9SKC", "99999"),
            worked("K3Y/1", "99999"),
            ContactRecord::new("G4ABC").with_mode(Mode::Cw),
            worked("G4ABC", "42"),
        ];
        let progress = evaluate(&contacts, &rules());
        assert_eq!(progress.current_value, 42.0);
    }

    #[test]
    fn test_contacts_before_start_ignored() {
        let contacts = vec![worked("W1AW", "500").with_date(NaiveDate::from_ymd_opt(2012, 12, 31).unwrap())];
        assert_eq!(evaluate(&contacts, &rules()).current_value, 0.0);
    }
}

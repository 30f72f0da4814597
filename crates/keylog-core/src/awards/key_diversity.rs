//! Contacts spread across several keying devices (Triple Key).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scope::{project, ProjectedContact, ScopeSpec};
use crate::error::RuleTableError;
use crate::models::{
    AwardId, AwardProgress, ContactRecord, EquipmentClass, KeyDiversityDetail, ProgressDetail,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDiversityRules {
    pub scope: ScopeSpec,
    pub required_classes: Vec<EquipmentClass>,
    /// Total qualifying contacts across all required classes.
    pub threshold: u32,
}

impl KeyDiversityRules {
    pub fn validate(&self, award: AwardId) -> Vec<RuleTableError> {
        let mut errors = Vec::new();
        if self.required_classes.is_empty() {
            errors.push(RuleTableError::EmptyRequiredClasses { award });
        }
        if self.threshold == 0 {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "threshold",
            });
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diversity {
    pub per_class: BTreeMap<EquipmentClass, u32>,
    pub members_per_class: BTreeMap<EquipmentClass, u32>,
    pub total_qualifying: u32,
    pub all_classes_present: bool,
    pub achieved: bool,
}

/// Count contacts per required class. Contacts with no class, or a class
/// outside `rules.required_classes`, are ignored.
pub fn diversity<'a>(
    contacts: impl IntoIterator<Item = ProjectedContact<'a>>,
    rules: &KeyDiversityRules,
) -> Diversity {
    let mut per_class: BTreeMap<EquipmentClass, u32> = rules
        .required_classes
        .iter()
        .map(|class| (*class, 0))
        .collect();
    let mut members: BTreeMap<EquipmentClass, BTreeSet<u32>> = BTreeMap::new();

    for contact in contacts {
        let Some(class) = contact.record.equipment_class else {
            continue;
        };
        let Some(count) = per_class.get_mut(&class) else {
            continue;
        };
        *count += 1;
        if let Some(base_id) = contact.base_id() {
            members.entry(class).or_default().insert(base_id);
        }
    }

    let total_qualifying = per_class.values().sum();
    let all_classes_present = per_class.values().all(|n| *n >= 1);
    let members_per_class = per_class
        .keys()
        .map(|class| (*class, members.get(class).map_or(0, |m| m.len() as u32)))
        .collect();

    Diversity {
        per_class,
        members_per_class,
        total_qualifying,
        all_classes_present,
        achieved: all_classes_present && total_qualifying >= rules.threshold,
    }
}

pub fn evaluate(contacts: &[ContactRecord], rules: &KeyDiversityRules) -> AwardProgress {
    let result = diversity(project(contacts, &rules.scope), rules);

    let missing_classes = result
        .per_class
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(class, _)| *class)
        .collect();

    debug!(
        total = result.total_qualifying,
        all_classes = result.all_classes_present,
        "Evaluated key diversity"
    );

    AwardProgress {
        award_id: AwardId::TripleKey,
        current_value: result.total_qualifying as f64,
        required_value: rules.threshold as f64,
        achieved: result.achieved,
        endorsement: None,
        detail: ProgressDetail::KeyDiversity(KeyDiversityDetail {
            per_class: result.per_class,
            members_per_class: result.members_per_class,
            missing_classes,
            all_classes_present: result.all_classes_present,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

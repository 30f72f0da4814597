//! DX awards: members worked outside the operator's own DXCC entity.
//!
//! DXQ counts distinct (entity, member) pairs, DXC counts distinct entities.
//! A maritime-mobile station only counts inside territorial waters, which
//! needs a recorded distance to prove.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::scope::{project, ProjectedContact, ScopeSpec};
use crate::error::RuleTableError;
use crate::models::{
    AwardId, AwardProgress, ContactRecord, Endorsement, EntityDetail, ProgressDetail,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCount {
    /// Each member counts once per entity.
    MemberPerEntity,
    /// Each entity counts once.
    Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRules {
    pub scope: ScopeSpec,
    pub count: EntityCount,
    /// The operator's own entity, which never counts.
    pub home_entity: u32,
    /// Furthest a maritime-mobile station may be, in miles.
    pub maritime_limit: f64,
    /// Ascending level thresholds; the first is the base award.
    pub levels: Vec<u32>,
    /// Level name prefix, as in "DXQ-25".
    pub label: String,
}

impl EntityRules {
    pub fn validate(&self, award: AwardId) -> Vec<RuleTableError> {
        let mut errors = Vec::new();
        if self.levels.is_empty() {
            errors.push(RuleTableError::EmptyLevels { award });
        }
        if self.levels.contains(&0) {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "level threshold",
            });
        }
        for pair in self.levels.windows(2) {
            if pair[1] <= pair[0] {
                errors.push(RuleTableError::NonAscendingThresholds {
                    award,
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        if !(self.maritime_limit.is_finite() && self.maritime_limit >= 0.0) {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "maritime distance limit",
            });
        }
        errors
    }

    fn admits(&self, contact: &ProjectedContact<'_>) -> Option<u32> {
        let entity = contact.record.entity.filter(|e| *e != self.home_entity)?;
        if contact.record.is_maritime_mobile() {
            let within = contact
                .record
                .effective_distance()
                .is_some_and(|d| d <= self.maritime_limit);
            if !within {
                trace!(callsign = contact.callsign(), "excluded: maritime mobile");
                return None;
            }
        }
        Some(entity)
    }

    /// Highest level reached.
    pub fn level_for(&self, count: u32) -> Option<u32> {
        self.levels.iter().copied().take_while(|t| *t <= count).last()
    }
}

/// Distinct members worked in each entity.
pub fn entities<'a>(
    contacts: impl IntoIterator<Item = ProjectedContact<'a>>,
    rules: &EntityRules,
) -> BTreeMap<u32, BTreeSet<u32>> {
    let mut worked: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    for contact in contacts {
        let Some(base_id) = contact.base_id() else {
            continue;
        };
        if let Some(entity) = rules.admits(&contact) {
            worked.entry(entity).or_default().insert(base_id);
        }
    }
    worked
}

pub fn evaluate(award: AwardId, contacts: &[ContactRecord], rules: &EntityRules) -> AwardProgress {
    let worked = entities(project(contacts, &rules.scope), rules);
    let count: u32 = match rules.count {
        EntityCount::MemberPerEntity => worked.values().map(|m| m.len() as u32).sum(),
        EntityCount::Entity => worked.len() as u32,
    };
    let base = rules.levels.first().copied().unwrap_or(u32::MAX);
    let level = rules.level_for(count);

    debug!(%award, count, entities = worked.len(), "Evaluated DX entities");

    AwardProgress {
        award_id: award,
        current_value: count as f64,
        required_value: base as f64,
        achieved: count >= base,
        endorsement: level.map(|n| Endorsement::Level {
            name: format!("{}-{}", rules.label, n),
        }),
        detail: ProgressDetail::Entities(EntityDetail {
            entities: worked
                .iter()
                .map(|(entity, members)| (*entity, members.len() as u32))
                .collect(),
            count,
            next_target: rules.levels.iter().copied().find(|t| *t > count),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

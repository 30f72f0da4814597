//! Accumulated conversation time (Rag Chew).
//!
//! Contacts of at least `min_minutes` add their length to a running total.
//! Working the same member twice in a row does not count twice: the second
//! contact is dropped until a different member has been worked in between.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::scope::{project, ProjectedContact, ScopeSpec};
use super::tiered::EndorsementTable;
use crate::error::RuleTableError;
use crate::models::{
    AwardId, AwardProgress, Band, BandMinutes, ContactRecord, DurationDetail, Endorsement,
    ProgressDetail,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationRules {
    pub scope: ScopeSpec,
    /// Shortest contact that counts, in minutes.
    pub min_minutes: f64,
    /// Minutes for the base award.
    pub threshold: u32,
    pub endorsements: EndorsementTable,
    /// Minutes on one band for each single-band multiple.
    pub band_threshold: u32,
}

impl DurationRules {
    pub fn validate(&self, award: AwardId) -> Vec<RuleTableError> {
        let mut errors = Vec::new();
        if self.threshold == 0 {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "threshold",
            });
        }
        if self.band_threshold == 0 {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "band threshold",
            });
        }
        if !(self.min_minutes.is_finite() && self.min_minutes >= 0.0) {
            errors.push(RuleTableError::ZeroThreshold {
                award,
                what: "minimum contact length",
            });
        }
        self.endorsements.validate(award, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChewTally {
    pub total_minutes: f64,
    pub qualifying_contacts: u32,
    pub back_to_back_rejected: u32,
    pub band_minutes: BTreeMap<Band, f64>,
}

/// Sum contact lengths in time order, dropping back-to-back repeats.
pub fn chew_time<'a>(
    contacts: impl IntoIterator<Item = ProjectedContact<'a>>,
    rules: &DurationRules,
) -> ChewTally {
    let mut timed: Vec<(ProjectedContact<'a>, f64)> = contacts
        .into_iter()
        .filter_map(|contact| {
            let minutes = contact.record.effective_duration()?;
            (minutes >= rules.min_minutes).then_some((contact, minutes))
        })
        .collect();
    timed.sort_by(|(a, a_min), (b, b_min)| {
        (a.date(), a.record.time, a.callsign(), a.base_id())
            .cmp(&(b.date(), b.record.time, b.callsign(), b.base_id()))
            .then(a_min.total_cmp(b_min))
    });

    let mut tally = ChewTally::default();
    let mut last_member = None;
    for (contact, minutes) in timed {
        let member = contact.base_id();
        if member.is_some() && member == last_member {
            trace!(callsign = contact.callsign(), "rejected: back-to-back");
            tally.back_to_back_rejected += 1;
            continue;
        }
        last_member = member;
        tally.qualifying_contacts += 1;
        tally.total_minutes += minutes;
        if let Some(band) = contact.band() {
            *tally.band_minutes.entry(band).or_insert(0.0) += minutes;
        }
    }
    tally
}

fn whole_minutes(minutes: f64) -> u32 {
    // saturating cast; NaN never reaches here
    minutes.floor() as u32
}

pub fn evaluate(contacts: &[ContactRecord], rules: &DurationRules) -> AwardProgress {
    let tally = chew_time(project(contacts, &rules.scope), rules);
    let minutes = whole_minutes(tally.total_minutes);
    let achieved = minutes >= rules.threshold;
    let (multiple, at_least) = rules.endorsements.multiple_for(minutes, rules.threshold);

    let bands = tally
        .band_minutes
        .iter()
        .map(|(band, minutes)| BandMinutes {
            band: *band,
            minutes: *minutes,
            multiple: rules
                .endorsements
                .multiple_for(whole_minutes(*minutes), rules.band_threshold)
                .0,
        })
        .collect();

    debug!(
        minutes = tally.total_minutes,
        contacts = tally.qualifying_contacts,
        rejected = tally.back_to_back_rejected,
        "Evaluated rag chew time"
    );

    AwardProgress {
        award_id: AwardId::RagChew,
        current_value: tally.total_minutes,
        required_value: rules.threshold as f64,
        achieved,
        endorsement: (achieved && multiple > 0)
            .then_some(Endorsement::Multiple { multiple, at_least }),
        detail: ProgressDetail::Duration(DurationDetail {
            total_minutes: tally.total_minutes,
            qualifying_contacts: tally.qualifying_contacts,
            back_to_back_rejected: tally.back_to_back_rejected,
            next_target: rules.endorsements.next_target(minutes, rules.threshold),
            bands,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

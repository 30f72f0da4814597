//! Narrowing a contact collection to the contacts one award cares about.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::identifier::ParsedIdentifier;
use crate::models::{Band, ContactRecord, EquipmentClass, Mode};

/// A contact field that must be present for the contact to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    /// A parseable membership identifier.
    Membership,
    Date,
    Band,
    TxPower,
    RxPower,
    Distance,
    Region,
    Continent,
    EquipmentClass,
    /// A positive contact length.
    Duration,
    /// A DXCC entity number.
    Entity,
}

/// How a contact's keying device is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "rule", content = "classes", rename_all = "snake_case")]
pub enum EquipmentRule {
    #[default]
    Any,
    /// Unrecorded passes; a recorded class must be listed.
    IfRecorded(Vec<EquipmentClass>),
    /// A listed class must be recorded.
    Required(Vec<EquipmentClass>),
}

impl EquipmentRule {
    fn admits(&self, class: Option<EquipmentClass>) -> bool {
        match (self, class) {
            (EquipmentRule::Any, _) => true,
            (EquipmentRule::IfRecorded(_), None) => true,
            (EquipmentRule::IfRecorded(allowed), Some(class)) => allowed.contains(&class),
            (EquipmentRule::Required(_), None) => false,
            (EquipmentRule::Required(allowed), Some(class)) => allowed.contains(&class),
        }
    }
}

/// Club and special-event callsigns that stop counting from a cutoff date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpecialCalls {
    pub calls: Vec<String>,
    /// Excluded on or after this date; `None` excludes them always.
    pub from: Option<NaiveDate>,
}

impl SpecialCalls {
    fn excludes(&self, contact: &ContactRecord) -> bool {
        let base = contact.base_callsign();
        if !self.calls.iter().any(|call| call.eq_ignore_ascii_case(&base)) {
            return false;
        }
        match (self.from, contact.date) {
            (None, _) => true,
            (Some(from), Some(date)) => date >= from,
            // Undated contact with a special call: cannot prove it predates the cutoff
            (Some(_), None) => true,
        }
    }
}

/// Which contacts an award considers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScopeSpec {
    /// Accepted modes; empty accepts any recorded or unrecorded mode.
    #[serde(default)]
    pub modes: Vec<Mode>,
    /// Earliest valid contact date (inclusive). Implies a date is required.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Latest valid contact date (inclusive). Implies a date is required.
    #[serde(default)]
    pub until: Option<NaiveDate>,
    #[serde(default)]
    pub required: Vec<RequiredField>,
    #[serde(default)]
    pub equipment: EquipmentRule,
    /// Accepted bands; `None` accepts any.
    #[serde(default)]
    pub bands: Option<Vec<Band>>,
    #[serde(default)]
    pub special_calls: SpecialCalls,
}

impl ScopeSpec {
    pub fn cw() -> Self {
        Self {
            modes: vec![Mode::Cw],
            ..Self::default()
        }
    }

    pub fn valid_from(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    pub fn valid_until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }

    pub fn require(mut self, field: RequiredField) -> Self {
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }

    pub fn equipment(mut self, rule: EquipmentRule) -> Self {
        self.equipment = rule;
        self
    }

    pub fn bands(mut self, bands: &[Band]) -> Self {
        self.bands = Some(bands.to_vec());
        self
    }

    pub fn special_calls(mut self, calls: &[&str], from: Option<NaiveDate>) -> Self {
        self.special_calls = SpecialCalls {
            calls: calls.iter().map(|c| c.to_string()).collect(),
            from,
        };
        self
    }

    pub fn requires(&self, field: RequiredField) -> bool {
        self.required.contains(&field)
    }

    /// Check one contact, returning its projection when it qualifies.
    pub fn admit<'a>(&self, contact: &'a ContactRecord) -> Option<ProjectedContact<'a>> {
        if !self.modes.is_empty() && !contact.mode.is_some_and(|m| self.modes.contains(&m)) {
            trace!(callsign = %contact.callsign, "excluded: mode");
            return None;
        }

        if self.from.is_some() || self.until.is_some() || self.requires(RequiredField::Date) {
            let Some(date) = contact.date else {
                trace!(callsign = %contact.callsign, "excluded: no date");
                return None;
            };
            if self.from.is_some_and(|from| date < from) || self.until.is_some_and(|until| date > until) {
                trace!(callsign = %contact.callsign, %date, "excluded: outside date range");
                return None;
            }
        }

        if let Some(bands) = &self.bands {
            if !contact.band.is_some_and(|b| bands.contains(&b)) {
                trace!(callsign = %contact.callsign, "excluded: band");
                return None;
            }
        }

        if !self.equipment.admits(contact.equipment_class) {
            trace!(callsign = %contact.callsign, "excluded: equipment class");
            return None;
        }

        if self.special_calls.excludes(contact) {
            trace!(callsign = %contact.callsign, "excluded: special-event call");
            return None;
        }

        let member = match contact.membership().map(ParsedIdentifier::parse) {
            Some(Ok(member)) => Some(member),
            Some(Err(e)) => {
                trace!(callsign = %contact.callsign, error = %e, "unparseable membership");
                None
            }
            None => None,
        };

        for field in &self.required {
            let present = match field {
                RequiredField::Membership => member.is_some(),
                RequiredField::Date => contact.date.is_some(),
                RequiredField::Band => contact.band.is_some(),
                RequiredField::TxPower => contact.effective_tx_power().is_some(),
                RequiredField::RxPower => contact.effective_rx_power().is_some(),
                RequiredField::Distance => contact.effective_distance().is_some(),
                RequiredField::Region => contact.normalized_region().is_some(),
                RequiredField::Continent => contact.normalized_continent().is_some(),
                RequiredField::EquipmentClass => contact.equipment_class.is_some(),
                RequiredField::Duration => contact.effective_duration().is_some(),
                RequiredField::Entity => contact.entity.is_some(),
            };
            if !present {
                trace!(callsign = %contact.callsign, ?field, "excluded: missing field");
                return None;
            }
        }

        Some(ProjectedContact { record: contact, member })
    }
}

/// A contact that passed an award's scope, with its membership parsed once.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedContact<'a> {
    pub record: &'a ContactRecord,
    /// Present whenever the scope requires membership.
    pub member: Option<ParsedIdentifier>,
}

impl<'a> ProjectedContact<'a> {
    pub fn callsign(&self) -> &'a str {
        &self.record.callsign
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record.date
    }

    pub fn band(&self) -> Option<Band> {
        self.record.band
    }

    pub fn base_id(&self) -> Option<u32> {
        self.member.map(|m| m.base_id)
    }
}

/// Lazy, restartable projection in source order. Clone it to iterate again.
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    contacts: std::slice::Iter<'a, ContactRecord>,
    scope: &'a ScopeSpec,
}

impl<'a> Iterator for Projection<'a> {
    type Item = ProjectedContact<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for contact in self.contacts.by_ref() {
            if let Some(projected) = self.scope.admit(contact) {
                return Some(projected);
            }
        }
        None
    }
}

pub fn project<'a>(contacts: &'a [ContactRecord], scope: &'a ScopeSpec) -> Projection<'a> {
    Projection {
        contacts: contacts.iter(),
        scope,
    }
}

// ============================================================================
// Tests
// ============================================================================

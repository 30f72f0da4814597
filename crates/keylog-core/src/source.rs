//! Where contacts come from.
//!
//! The engine only ever reads from a source. A source may be a database,
//! a file snapshot or a plain slice; it is asked once per evaluation for
//! every contact that could matter to any award.

use std::convert::Infallible;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::awards::rules::RuleTables;
use crate::awards::scope::{RequiredField, ScopeSpec};
use crate::models::{ContactRecord, Mode};

/// Constraints a source applies before handing contacts to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactQuery {
    /// Empty means any mode.
    pub modes: Vec<Mode>,
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub required: Vec<RequiredField>,
}

impl ContactQuery {
    /// The narrowest query that still returns every contact any of `scopes`
    /// would admit.
    pub fn covering<'a>(scopes: impl IntoIterator<Item = &'a ScopeSpec>) -> Self {
        let mut scopes = scopes.into_iter();
        let Some(first) = scopes.next() else {
            return Self::default();
        };

        let mut query = Self {
            modes: first.modes.clone(),
            from: first.from,
            until: first.until,
            required: first.required.clone(),
        };

        for scope in scopes {
            if query.modes.is_empty() || scope.modes.is_empty() {
                query.modes.clear();
            } else {
                for mode in &scope.modes {
                    if !query.modes.contains(mode) {
                        query.modes.push(*mode);
                    }
                }
            }
            query.from = match (query.from, scope.from) {
                (Some(a), Some(b)) => Some(a.min(b)),
                _ => None,
            };
            query.until = match (query.until, scope.until) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            };
            query.required.retain(|field| scope.requires(*field));
        }

        query
    }

    /// Query covering every award in `rules`.
    pub fn for_rules(rules: &RuleTables) -> Self {
        Self::covering(rules.scopes())
    }

    pub fn matches(&self, contact: &ContactRecord) -> bool {
        if !self.modes.is_empty() && !contact.mode.is_some_and(|m| self.modes.contains(&m)) {
            return false;
        }
        if self.from.is_some() || self.until.is_some() {
            let Some(date) = contact.date else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.until.is_some_and(|until| date > until) {
                return false;
            }
        }
        // Defer to the scope check for field semantics
        let scope = ScopeSpec {
            required: self.required.clone(),
            ..ScopeSpec::default()
        };
        scope.admit(contact).is_some()
    }
}

/// A read-only supplier of contacts.
pub trait ContactSource {
    type Error;

    fn query(&self, query: &ContactQuery) -> Result<Vec<ContactRecord>, Self::Error>;
}

impl ContactSource for [ContactRecord] {
    type Error = Infallible;

    fn query(&self, query: &ContactQuery) -> Result<Vec<ContactRecord>, Self::Error> {
        Ok(self.iter().filter(|c| query.matches(c)).cloned().collect())
    }
}

impl ContactSource for Vec<ContactRecord> {
    type Error = Infallible;

    fn query(&self, query: &ContactQuery) -> Result<Vec<ContactRecord>, Self::Error> {
        self.as_slice().query(query)
    }
}

// ============================================================================
// Tests
// ============================================================================

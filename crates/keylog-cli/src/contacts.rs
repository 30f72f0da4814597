//! Contact snapshots read from JSON files.
//!
//! A snapshot is either a bare array of contacts or an object with a
//! `contacts` array, as written by logging programs' JSON exports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use keylog_core::{ContactQuery, ContactRecord, ContactSource};
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Bare(Vec<ContactRecord>),
    Wrapped { contacts: Vec<ContactRecord> },
}

pub fn parse_snapshot(json: &str) -> Result<Vec<ContactRecord>> {
    let snapshot: SnapshotFile =
        serde_json::from_str(json).context("Contact snapshot is not a list of contacts")?;
    Ok(match snapshot {
        SnapshotFile::Bare(contacts) | SnapshotFile::Wrapped { contacts } => contacts,
    })
}

/// A contact snapshot on disk, re-read on every query.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every contact in the file, unfiltered.
    pub fn read_all(&self) -> Result<Vec<ContactRecord>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read contacts: {}", self.path.display()))?;
        let contacts = parse_snapshot(&contents)
            .with_context(|| format!("Failed to parse contacts: {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = contacts.len(), "Loaded contact snapshot");
        Ok(contacts)
    }
}

impl ContactSource for SnapshotSource {
    type Error = anyhow::Error;

    fn query(&self, query: &ContactQuery) -> Result<Vec<ContactRecord>> {
        let contacts = self.read_all()?;
        Ok(contacts.into_iter().filter(|c| query.matches(c)).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use keylog_core::{Band, Mode};

    const SAMPLE: &str = r#"[
        {"callsign": "W1AW", "qso_date": "20210314", "band": "40m", "mode": "CW",
         "skcc_number": "1234T", "key_type": "BUG", "tx_power": 5, "state": "CT"},
        {"callsign": "N0CALL", "date": "2021-03-15", "band": "11M", "mode": "SSB"}
    ]"#;

    #[test]
    fn test_parse_bare_array() {
        let contacts = parse_snapshot(SAMPLE).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].band, Some(Band::M40));
        assert_eq!(contacts[0].remote_membership.as_deref(), Some("1234T"));
        assert_eq!(contacts[0].region.as_deref(), Some("CT"));
        // Unknown band is absent, not an error
        assert_eq!(contacts[1].band, None);
        assert_eq!(contacts[1].mode, Some(Mode::Ssb));
    }

    #[test]
    fn test_parse_wrapped_object() {
        let wrapped = format!(r#"{{"contacts": {}}}"#, SAMPLE);
        assert_eq!(parse_snapshot(&wrapped).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(parse_snapshot(r#"{"qsos": []}"#).is_err());
        assert!(parse_snapshot("not json").is_err());
    }

    #[test]
    fn test_source_applies_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let source = SnapshotSource::new(&path);
        let query = ContactQuery {
            modes: vec![Mode::Cw],
            ..ContactQuery::default()
        };
        let contacts = source.query(&query).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].callsign, "W1AW");
    }

    #[test]
    fn test_missing_file_is_error() {
        let source = SnapshotSource::new("/no/such/log.json");
        assert!(source.read_all().is_err());
    }
}

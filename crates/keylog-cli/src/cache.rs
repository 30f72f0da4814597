//! The last evaluated report, kept on disk between runs.
//!
//! One file holds one report together with the fingerprint of the inputs
//! it came from: a SHA-256 digest of the rule tables and every contact the
//! engine was given. A lookup with any other fingerprint misses, so a
//! stored report always matches its inputs and only its age can vary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use keylog_core::{AwardReport, ContactRecord, RuleTables};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

const REPORT_FILE: &str = "report.json";

/// Hex SHA-256 over the rules version, the rule tables and every contact.
pub fn fingerprint(contacts: &[ContactRecord], rules: &RuleTables) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(rules.version.to_le_bytes());
    hasher.update(serde_json::to_vec(rules)?);
    for contact in contacts {
        hasher.update(serde_json::to_vec(contact)?);
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    pub fingerprint: String,
    pub evaluated_at: DateTime<Utc>,
    pub report: AwardReport,
}

impl StoredReport {
    /// Time since evaluation; zero if the clock has gone backwards.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.evaluated_at).max(Duration::zero())
    }

    /// "evaluated 5 min ago" and so on, for log lines.
    pub fn freshness(&self) -> String {
        let age = self.age();
        match (age.num_days(), age.num_hours(), age.num_minutes()) {
            (0, 0, 0) => "evaluated moments ago".to_string(),
            (0, 0, minutes) => format!("evaluated {} min ago", minutes),
            (0, 1, _) => "evaluated 1 hour ago".to_string(),
            (0, hours, _) => format!("evaluated {} hours ago", hours),
            (1, _, _) => "evaluated yesterday".to_string(),
            (days, _, _) => format!("evaluated {} days ago", days),
        }
    }
}

/// The report file inside a per-operator cache directory.
pub struct ReportCache {
    path: PathBuf,
}

impl ReportCache {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report cache: {}", dir.display()))?;
        Ok(Self {
            path: dir.join(REPORT_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored report, if it was evaluated from inputs with `fingerprint`.
    pub fn lookup(&self, fingerprint: &str) -> Result<Option<StoredReport>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read stored report: {}", self.path.display())
                })
            }
        };
        let stored: StoredReport = serde_json::from_str(&contents)
            .with_context(|| format!("Stored report is corrupt: {}", self.path.display()))?;

        if stored.fingerprint != fingerprint {
            debug!(stored = %stored.fingerprint, "Stored report is for other inputs");
            return Ok(None);
        }
        Ok(Some(stored))
    }

    /// Replace the stored report. Written beside the target and renamed
    /// over it, so a reader never sees half a file.
    pub fn store(&self, fingerprint: &str, report: &AwardReport) -> Result<()> {
        let stored = StoredReport {
            fingerprint: fingerprint.to_string(),
            evaluated_at: Utc::now(),
            report: report.clone(),
        };
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, serde_json::to_vec_pretty(&stored)?)
            .with_context(|| format!("Failed to write report: {}", staging.display()))?;
        std::fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to replace report: {}", self.path.display()))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use keylog_core::{evaluate_all, Mode};

    fn contacts() -> Vec<ContactRecord> {
        vec![
            ContactRecord::new("W1AW").with_mode(Mode::Cw).with_membership("1"),
            ContactRecord::new("K2XX").with_mode(Mode::Cw).with_membership("2C"),
        ]
    }

    fn stored(age: Duration) -> StoredReport {
        StoredReport {
            fingerprint: String::new(),
            evaluated_at: Utc::now() - age,
            report: evaluate_all(&[], &RuleTables::default()),
        }
    }

    #[test]
    fn test_fingerprint_tracks_inputs() {
        let rules = RuleTables::default();
        let base = fingerprint(&contacts(), &rules).unwrap();
        assert_eq!(base, fingerprint(&contacts(), &rules).unwrap());
        assert_eq!(base.len(), 64);

        let mut more = contacts();
        more.push(ContactRecord::new("N3YY"));
        assert_ne!(base, fingerprint(&more, &rules).unwrap());

        let mut bumped = RuleTables::default();
        bumped.version += 1;
        assert_ne!(base, fingerprint(&contacts(), &bumped).unwrap());
    }

    #[test]
    fn test_store_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ReportCache::open(&dir.path().join("cache")).unwrap();
        let rules = RuleTables::default();
        let report = evaluate_all(&contacts(), &rules);
        let key = fingerprint(&contacts(), &rules).unwrap();

        assert!(cache.lookup(&key).unwrap().is_none());
        cache.store(&key, &report).unwrap();
        assert!(cache.path().exists());
        assert!(!cache.path().with_extension("json.tmp").exists());

        let found = cache.lookup(&key).unwrap().unwrap();
        assert_eq!(found.report, report);
        assert!(cache.lookup("other").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_report_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ReportCache::open(dir.path()).unwrap();
        std::fs::write(cache.path(), "{").unwrap();
        assert!(cache.lookup("x").is_err());
    }

    #[test]
    fn test_freshness_wording() {
        assert_eq!(stored(Duration::zero()).freshness(), "evaluated moments ago");
        assert_eq!(stored(Duration::minutes(5)).freshness(), "evaluated 5 min ago");
        assert_eq!(stored(Duration::minutes(95)).freshness(), "evaluated 1 hour ago");
        assert_eq!(stored(Duration::hours(5)).freshness(), "evaluated 5 hours ago");
        assert_eq!(stored(Duration::hours(30)).freshness(), "evaluated yesterday");
        assert_eq!(stored(Duration::days(3)).freshness(), "evaluated 3 days ago");
        // A report stamped in the future is treated as new
        assert_eq!(stored(Duration::minutes(-10)).freshness(), "evaluated moments ago");
    }
}

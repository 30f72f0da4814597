//! Operator configuration.
//!
//! Stored at `~/.config/keylog/config.json`. Values from the environment
//! (including a `.env` file) take precedence over the file:
//!
//! - `KEYLOG_CONTACTS`: path to the contact snapshot
//! - `KEYLOG_REFRESH_SECS`: re-evaluation interval for `--watch`
//! - `KEYLOG_MEMBER`: the operator's own membership number

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use keylog_core::awards::RuleTables;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "keylog";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default re-evaluation interval for `--watch`
pub const DEFAULT_REFRESH_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub membership_number: Option<String>,
    pub contacts_path: Option<PathBuf>,
    pub refresh_interval_secs: Option<u64>,
    /// When set, logs go to a daily rolling file here instead of stderr.
    pub log_dir: Option<PathBuf>,
    /// JSON file overriding parts of the default rule tables.
    pub rules_path: Option<PathBuf>,
    /// Known date the Senator prerequisite was reached.
    pub tier3_start: Option<NaiveDate>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;

        let mut path = cache_dir.join(APP_NAME);
        if let Some(ref member) = self.membership_number {
            path = path.join(member);
        }
        Ok(path)
    }

    /// Apply `KEYLOG_*` overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("KEYLOG_CONTACTS").filter(|v| !v.trim().is_empty()) {
            self.contacts_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("KEYLOG_REFRESH_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.refresh_interval_secs = Some(secs),
                _ => warn!(value = %raw, "Ignoring invalid KEYLOG_REFRESH_SECS"),
            }
        }
        if let Some(member) = lookup("KEYLOG_MEMBER").filter(|v| !v.trim().is_empty()) {
            self.membership_number = Some(member.trim().to_string());
        }
        self
    }

    pub fn refresh_interval_secs(&self) -> u64 {
        match self.refresh_interval_secs {
            Some(0) => {
                warn!(
                    default = DEFAULT_REFRESH_SECS,
                    "refresh_interval_secs must be positive, using default"
                );
                DEFAULT_REFRESH_SECS
            }
            Some(secs) => secs,
            None => DEFAULT_REFRESH_SECS,
        }
    }

    /// Default rule tables, with the override file and Senator start date applied.
    pub fn rule_tables(&self) -> Result<RuleTables> {
        let mut rules = match &self.rules_path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read rule tables: {}", path.display()))?;
                RuleTables::from_json(&contents)
                    .with_context(|| format!("Failed to parse rule tables: {}", path.display()))?
            }
            None => RuleTables::default(),
        };
        if let Some(start) = self.tier3_start {
            rules.tiers.top_counting_after = Some(start);
        }
        Ok(rules)
    }
}

// ============================================================================
// Tests
// ============================================================================

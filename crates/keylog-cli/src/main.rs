//! keylog - award progress reports from a contact snapshot.
//!
//! Reads a JSON contact snapshot, evaluates every club award and prints a
//! text or JSON report. With `--watch` the snapshot is re-read and the
//! report reprinted whenever it changes.

mod cache;
mod config;
mod contacts;
mod report;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use keylog_core::{AwardEngine, AwardReport, ContactQuery, ContactSource};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cache::{fingerprint, ReportCache};
use config::Config;
use contacts::SnapshotSource;

const USAGE: &str = "\
Usage: keylog [OPTIONS] [CONTACTS.json]

Options:
  --json             Print the report as JSON
  --watch            Re-evaluate every refresh interval until interrupted
  --rules <FILE>     Rule-table override file
  --no-cache         Always re-evaluate, ignoring the report cache
  --save-config      Store the given contacts path and rules file in the config
  -h, --help         Show this help";

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct Args {
    contacts: Option<PathBuf>,
    rules: Option<PathBuf>,
    json: bool,
    watch: bool,
    no_cache: bool,
    save_config: bool,
    help: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => parsed.json = true,
                "--watch" => parsed.watch = true,
                "--no-cache" => parsed.no_cache = true,
                "--save-config" => parsed.save_config = true,
                "-h" | "--help" => parsed.help = true,
                "--rules" => {
                    let path = args.next().context("--rules needs a file")?;
                    parsed.rules = Some(PathBuf::from(path));
                }
                flag if flag.starts_with('-') => bail!("Unknown option: {}", flag),
                path => {
                    if parsed.contacts.is_some() {
                        bail!("Only one contacts file may be given");
                    }
                    parsed.contacts = Some(PathBuf::from(path));
                }
            }
        }
        Ok(parsed)
    }
}

// ============================================================================
// Setup
// ============================================================================

/// Initialize the tracing subscriber for logging.
///
/// Uses `RUST_LOG` (default `warn`). Logs go to stderr, or to a daily file
/// under `log_dir` when configured; the returned guard must stay alive for
/// file output to be flushed.
fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "keylog.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

struct Runner {
    engine: AwardEngine,
    source: SnapshotSource,
    /// Covers every enabled award's scope; computed once per engine.
    query: ContactQuery,
    cache: Option<ReportCache>,
}

impl Runner {
    fn new(engine: AwardEngine, source: SnapshotSource, cache: Option<ReportCache>) -> Self {
        let query = ContactQuery::for_rules(engine.rules());
        Self {
            engine,
            source,
            query,
            cache,
        }
    }

    /// Evaluate the current snapshot, reusing the stored report when the
    /// inputs are unchanged. Returns the fingerprint alongside the report.
    fn evaluate(&self) -> Result<(String, AwardReport)> {
        let contacts = self.source.query(&self.query)?;
        let key = fingerprint(&contacts, self.engine.rules())?;

        if let Some(cache) = &self.cache {
            match cache.lookup(&key) {
                Ok(Some(stored)) => {
                    debug!(freshness = %stored.freshness(), "Reusing stored report");
                    return Ok((key, stored.report));
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Ignoring unreadable stored report"),
            }
        }

        let report = self.engine.evaluate_all(&contacts);
        info!(
            contacts = contacts.len(),
            achieved = report.achieved().count(),
            "Evaluated awards"
        );

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&key, &report) {
                warn!(error = %e, "Failed to store report");
            }
        }
        Ok((key, report))
    }
}

fn print_report(report: &AwardReport, json: bool, member: Option<&str>) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report::render_text(report, member));
    }
    Ok(())
}

async fn watch(runner: &Runner, interval_secs: u64, json: bool, member: Option<&str>) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    let mut last_key: Option<String> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match runner.evaluate() {
                    Ok((key, report)) => {
                        if last_key.as_deref() != Some(key.as_str()) {
                            print_report(&report, json, member)?;
                            last_key = Some(key);
                        }
                    }
                    // A snapshot mid-write is retried on the next tick
                    Err(e) => warn!(error = %e, "Evaluation failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    // Environment overrides may warn, so tracing must be up first
    let file_config = Config::load()?;
    let _guard = init_tracing(file_config.log_dir.as_ref());
    info!("keylog starting");

    let mut config = file_config.with_env();
    if let Some(path) = args.contacts.clone() {
        config.contacts_path = Some(path);
    }
    if let Some(path) = args.rules.clone() {
        config.rules_path = Some(path);
    }

    if args.save_config {
        config.save()?;
        info!("Configuration saved");
    }

    let Some(contacts_path) = config.contacts_path.clone() else {
        bail!("No contacts file given\n\n{}", USAGE);
    };

    let engine = AwardEngine::new(config.rule_tables()?);
    let cache = if args.no_cache {
        None
    } else {
        match config.cache_dir().and_then(|dir| ReportCache::open(&dir)) {
            Ok(cache) => {
                debug!(path = %cache.path().display(), "Report storage ready");
                Some(cache)
            }
            Err(e) => {
                warn!(error = %e, "Report storage unavailable");
                None
            }
        }
    };
    let runner = Runner::new(engine, SnapshotSource::new(contacts_path), cache);
    let member = config.membership_number.as_deref();
    info!(path = %runner.source.path().display(), "Reading contacts");

    if args.watch {
        watch(&runner, config.refresh_interval_secs(), args.json, member).await
    } else {
        let (_, report) = runner.evaluate()?;
        print_report(&report, args.json, member)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Command implementations.

pub mod checkpoint;
pub mod completions;
pub mod init;
pub mod resync;
pub mod sheet;
pub mod status;
pub mod sync;
pub mod version;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::config::{Settings, resolve_config_path, resolve_db_path};
use crate::error::{Error, Result};
use crate::model::to_iso;
use crate::storage::{Event, EventType, SqliteStorage};
use crate::sync::{BatchReport, SyncOutcome};

/// Paths given on the command line (or through the environment).
#[derive(Debug, Clone, Copy, Default)]
pub struct Paths<'a> {
    pub db: Option<&'a Path>,
    pub config: Option<&'a Path>,
}

impl Paths<'_> {
    /// Resolved database path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if no home directory can be found.
    pub fn db_path(&self) -> Result<PathBuf> {
        resolve_db_path(self.db).ok_or(Error::NotInitialized)
    }

    /// Resolved settings file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if no home directory can be found.
    pub fn config_path(&self) -> Result<PathBuf> {
        resolve_config_path(self.config).ok_or(Error::NotInitialized)
    }
}

/// Open an existing database; a missing file means `init` was never run.
pub(crate) fn open_storage(paths: &Paths<'_>) -> Result<SqliteStorage> {
    let db_path = paths.db_path()?;
    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }
    SqliteStorage::open(&db_path)
}

/// Load settings along with the path they came from.
pub(crate) fn load_settings(paths: &Paths<'_>) -> Result<(PathBuf, Settings)> {
    let config_path = paths.config_path()?;
    let settings = Settings::load(&config_path)?;
    Ok((config_path, settings))
}

/// Render epoch millis for humans.
pub(crate) fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(|| millis.to_string(), |dt| to_iso(&dt))
}

/// Render an optional checkpoint for humans.
pub(crate) fn format_checkpoint(checkpoint: Option<DateTime<Utc>>) -> String {
    checkpoint.map_or_else(|| "never".to_string(), |ts| to_iso(&ts))
}

#[derive(Serialize)]
struct FailureDetail<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct SkipDetail<'a> {
    reason: &'a str,
}

/// Append one history event per outcome and failure in a batch.
pub(crate) fn record_batch(
    storage: &SqliteStorage,
    batch: &BatchReport,
    applied_type: EventType,
) -> Result<()> {
    for outcome in &batch.outcomes {
        let event = match outcome {
            SyncOutcome::Applied(report) => Event::new(&report.source, applied_type)
                .with_store(&report.store)
                .with_detail(serde_json::to_string(report)?),
            SyncOutcome::Skipped { source, reason } => Event::new(source, EventType::SyncSkipped)
                .with_detail(serde_json::to_string(&SkipDetail { reason })?),
        };
        storage.record_event(&event)?;
    }

    for failure in &batch.failures {
        let event = Event::new(&failure.source, EventType::SyncFailed)
            .with_store(&failure.store)
            .with_detail(serde_json::to_string(&FailureDetail {
                error: &failure.error,
            })?);
        storage.record_event(&event)?;
    }
    Ok(())
}

/// Print a batch result as JSON or as one line per config.
pub(crate) fn print_batch(batch: &BatchReport, json: bool) -> Result<()> {
    if json {
        let payload = serde_json::to_string(batch)?;
        println!("{payload}");
        return Ok(());
    }

    if batch.outcomes.is_empty() && batch.failures.is_empty() {
        println!("{}", "No sync configs. Add entries to \"syncs\" in the settings file.".dimmed());
        return Ok(());
    }

    for outcome in &batch.outcomes {
        match outcome {
            SyncOutcome::Applied(report) => {
                let s = &report.stats;
                println!(
                    "{} {} → {}  +{} ~{} -{}  ({} window{}, checkpoint {})",
                    "✓".green(),
                    report.source.bold(),
                    report.store,
                    s.inserted,
                    s.updated,
                    s.deleted,
                    report.windows,
                    if report.windows == 1 { "" } else { "s" },
                    to_iso(&report.checkpoint).dimmed(),
                );
                if s.protected > 0 {
                    println!("  {} {} unmatched row(s) kept", "·".dimmed(), s.protected);
                }
                if report.capped {
                    println!(
                        "  {} iteration cap reached; run sync again to continue",
                        "!".yellow()
                    );
                }
            }
            SyncOutcome::Skipped { source, reason } => {
                println!("{} {}  skipped: {}", "-".yellow(), source.bold(), reason.dimmed());
            }
        }
    }

    for failure in &batch.failures {
        println!(
            "{} {} → {}  {}",
            "✗".red(),
            failure.source.bold(),
            failure.store,
            failure.error.red()
        );
    }

    let totals = batch.totals();
    println!();
    println!(
        "{} inserted, {} updated, {} deleted, {} unchanged",
        totals.inserted, totals.updated, totals.deleted, totals.unchanged
    );
    Ok(())
}

/// Turn isolated failures into a non-zero exit.
pub(crate) fn check_batch(batch: &BatchReport) -> Result<()> {
    if batch.is_success() {
        return Ok(());
    }
    Err(Error::SyncFailed {
        failed: batch.failures.len(),
        total: batch.outcomes.len() + batch.failures.len(),
    })
}

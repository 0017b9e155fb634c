//! Status command implementation.

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::cli::commands::{Paths, format_millis, load_settings, open_storage};
use crate::error::Result;
use crate::model::to_iso;
use crate::source::{count_lines, source_path};
use crate::storage::Event;
use crate::sync::CheckpointStore;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    config: PathBuf,
    database: PathBuf,
    source_dir: PathBuf,
    syncs: Vec<SyncStatus>,
}

#[derive(Serialize)]
struct SyncStatus {
    index: usize,
    source: String,
    store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    checkpoint: Option<String>,
    source_records: Option<usize>,
    sheet_rows: usize,
    last_event: Option<Event>,
}

/// Execute status command.
///
/// # Errors
///
/// Returns an error if settings or the database cannot be opened.
pub fn execute(paths: &Paths<'_>, json: bool) -> Result<()> {
    let (config_path, settings) = load_settings(paths)?;
    let storage = open_storage(paths)?;
    let source_dir = settings.source_dir(&config_path);

    let mut properties = storage.properties();
    let checkpoints = CheckpointStore::new(&mut properties);

    let mut syncs = Vec::with_capacity(settings.syncs.len());
    for (index, config) in settings.syncs.iter().enumerate() {
        let source_records = match source_path(&source_dir, &config.source) {
            Some(path) if path.is_file() => Some(count_lines(&path)?),
            _ => None,
        };

        syncs.push(SyncStatus {
            index,
            source: config.source.clone(),
            store: config.store.clone(),
            filter: config.filter.clone(),
            checkpoint: checkpoints.peek(&config.source)?.map(|ts| to_iso(&ts)),
            source_records,
            sheet_rows: storage.sheet(&config.store).row_count()?,
            last_event: storage.last_event(&config.source)?,
        });
    }

    let output = StatusOutput {
        config: config_path,
        database: paths.db_path()?,
        source_dir,
        syncs,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "calsheet status".bold().underline());
    println!("  Settings: {}", output.config.display());
    println!("  Database: {}", output.database.display());
    println!("  Sources:  {}", output.source_dir.display());
    println!();

    if output.syncs.is_empty() {
        println!("{}", "No sync configs. Add entries to \"syncs\" in the settings file.".dimmed());
        return Ok(());
    }

    for sync in &output.syncs {
        let filter = sync
            .filter
            .as_deref()
            .map(|f| format!(" [{f}]"))
            .unwrap_or_default();
        println!(
            "{} {} → {}{}",
            format!("#{}", sync.index).dimmed(),
            sync.source.bold(),
            sync.store,
            filter.dimmed()
        );

        let records = match sync.source_records {
            Some(n) => format!("{n} record(s)"),
            None => "no source file".yellow().to_string(),
        };
        println!("    Source:     {records}");
        println!("    Sheet:      {} row(s)", sync.sheet_rows);
        println!(
            "    Checkpoint: {}",
            sync.checkpoint.as_deref().unwrap_or("never")
        );

        if let Some(event) = &sync.last_event {
            let kind = event.event_type.as_str();
            let kind = if kind.ends_with("failed") {
                kind.red().to_string()
            } else {
                kind.green().to_string()
            };
            println!(
                "    Last run:   {kind} {}",
                format_millis(event.created_at).dimmed()
            );
        } else {
            println!("    Last run:   {}", "never".dimmed());
        }
    }
    Ok(())
}

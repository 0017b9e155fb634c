//! Checkpoint command implementations.
//!
//! Checkpoints live in the `properties` table under
//! `calsheet.checkpoint.<source>`; these commands read and adjust them
//! without going through a sync.

use colored::Colorize;
use serde::Serialize;

use crate::cli::CheckpointCommands;
use crate::cli::commands::{Paths, format_checkpoint, open_storage};
use crate::error::{Error, Result};
use crate::model::to_iso;
use crate::storage::{Event, EventType, SqliteStorage};
use crate::sync::{CHECKPOINT_KEY, CheckpointStore, parse_instant};

#[derive(Serialize)]
struct CheckpointOutput {
    source: String,
    /// Raw stored value (epoch millis).
    value: String,
    /// Parsed instant; `None` when the stored value is invalid.
    checkpoint: Option<String>,
}

#[derive(Serialize)]
struct ChangeOutput<'a> {
    source: &'a str,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    checkpoint: Option<String>,
}

/// Execute checkpoint commands.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, a timestamp is
/// invalid, or a requested checkpoint does not exist.
pub fn execute(command: &CheckpointCommands, paths: &Paths<'_>, json: bool) -> Result<()> {
    let storage = open_storage(paths)?;

    match command {
        CheckpointCommands::Show { source } => show(&storage, source.as_deref(), json),
        CheckpointCommands::Clear { source } => clear(&storage, source, json),
        CheckpointCommands::Set { source, at } => set(&storage, source, at, json),
    }
}

fn stored(storage: &SqliteStorage) -> Result<Vec<CheckpointOutput>> {
    let prefix = format!("{CHECKPOINT_KEY}.");
    let mut properties = storage.properties();
    let checkpoints = CheckpointStore::new(&mut properties);

    let mut out = Vec::new();
    for (key, value) in storage.properties_with_prefix(&prefix)? {
        let Some(source) = key.strip_prefix(&prefix).map(str::to_string) else {
            continue;
        };
        let checkpoint = checkpoints.peek(&source)?.map(|ts| to_iso(&ts));
        out.push(CheckpointOutput {
            source,
            value,
            checkpoint,
        });
    }
    Ok(out)
}

fn show(storage: &SqliteStorage, source: Option<&str>, json: bool) -> Result<()> {
    let mut entries = stored(storage)?;
    if let Some(source) = source {
        entries.retain(|e| e.source == source);
        if entries.is_empty() {
            return Err(Error::CheckpointNotFound {
                source_id: source.to_string(),
            });
        }
    }

    if json {
        let payload = serde_json::to_string(&entries)?;
        println!("{payload}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No checkpoints stored.");
        return Ok(());
    }

    let width = entries.iter().map(|e| e.source.len()).max().unwrap_or(0);
    for entry in &entries {
        match &entry.checkpoint {
            Some(ts) => println!("{:width$}  {ts}", entry.source.bold()),
            None => println!(
                "{:width$}  {} {}",
                entry.source.bold(),
                entry.value.yellow(),
                "(invalid, next sync starts from epoch)".dimmed()
            ),
        }
    }
    Ok(())
}

fn clear(storage: &SqliteStorage, source: &str, json: bool) -> Result<()> {
    let mut properties = storage.properties();
    let mut checkpoints = CheckpointStore::new(&mut properties);
    checkpoints.clear(source)?;

    storage.record_event(&Event::new(source, EventType::CheckpointCleared))?;

    if json {
        let output = ChangeOutput {
            source,
            action: "cleared",
            checkpoint: None,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Cleared checkpoint for {}", source.bold());
        println!("{}", "The next sync starts from the epoch.".dimmed());
    }
    Ok(())
}

fn set(storage: &SqliteStorage, source: &str, at: &str, json: bool) -> Result<()> {
    let ts = parse_instant(at)?;

    let mut properties = storage.properties();
    let mut checkpoints = CheckpointStore::new(&mut properties);
    let previous = checkpoints.peek(source)?;
    checkpoints.set(source, ts)?;

    let iso = to_iso(&ts);
    storage.record_event(
        &Event::new(source, EventType::CheckpointSet).with_detail(serde_json::json!({
            "checkpoint": iso,
            "previous": previous.map(|p| to_iso(&p)),
        })
        .to_string()),
    )?;

    if json {
        let output = ChangeOutput {
            source,
            action: "set",
            checkpoint: Some(iso),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "Checkpoint for {}: {} → {}",
            source.bold(),
            format_checkpoint(previous).dimmed(),
            iso.green()
        );
    }
    Ok(())
}

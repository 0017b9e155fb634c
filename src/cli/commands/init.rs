//! Initialize calsheet.
//!
//! Creates the settings file, the source directory next to it and the
//! database. An existing database is opened rather than replaced, so
//! `--force` only rewrites the settings file.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::cli::commands::Paths;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;

#[derive(Serialize)]
struct InitOutput {
    config: PathBuf,
    database: PathBuf,
    source_dir: PathBuf,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if the settings file exists and
/// `force` is not set, or an error if a directory or the database cannot
/// be created.
pub fn execute(paths: &Paths<'_>, force: bool, json: bool) -> Result<()> {
    let config_path = paths.config_path()?;
    let db_path = paths.db_path()?;

    if config_path.exists() && !force {
        return Err(Error::AlreadyInitialized { path: config_path });
    }

    let settings = Settings::default();
    settings.save(&config_path)?;

    let source_dir = settings.source_dir(&config_path);
    fs::create_dir_all(&source_dir)?;

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    SqliteStorage::open(&db_path)?;

    if json {
        let output = InitOutput {
            config: config_path,
            database: db_path,
            source_dir,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Initialized calsheet");
        println!("  Settings: {}", config_path.display());
        println!("  Database: {}", db_path.display());
        println!("  Sources:  {}", source_dir.display());
        println!();
        println!("Next: add entries to \"syncs\" and drop <source>.jsonl files into the sources directory.");
    }

    Ok(())
}

//! Configuration management.
//!
//! calsheet keeps everything under one global directory:
//!
//! - **Settings**: `~/.calsheet/config.json` (sync configs and tuning)
//! - **Database**: `~/.calsheet/data/calsheet.db` (sheets, checkpoints, history)
//! - **Sources**: `~/.calsheet/sources/<source>.jsonl` unless `source_dir` says otherwise
//!
//! Both the settings file and the database can be relocated with flags or
//! environment variables.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{SyncConfig, SyncOptions};
use crate::source::atomic_write;

/// Settings file name inside the global directory.
pub const CONFIG_FILE: &str = "config.json";

/// Default source directory name, relative to the settings file.
pub const DEFAULT_SOURCE_DIR: &str = "sources";

/// Get the global calsheet directory (`~/.calsheet`).
#[must_use]
pub fn global_calsheet_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".calsheet"))
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag)
/// 2. `CALSHEET_DB` environment variable
/// 3. `~/.calsheet/data/calsheet.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_path("CALSHEET_DB") {
        return Some(path);
    }

    global_calsheet_dir().map(|dir| dir.join("data").join("calsheet.db"))
}

/// Resolve the settings file path.
///
/// Priority:
/// 1. `explicit_path` (the `--config` flag)
/// 2. `CALSHEET_CONFIG` environment variable
/// 3. `~/.calsheet/config.json`
#[must_use]
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_path("CALSHEET_CONFIG") {
        return Some(path);
    }

    global_calsheet_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `<source>.jsonl` files. Relative paths resolve
    /// against the settings file's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,

    /// Driver tuning.
    pub options: SyncOptions,

    /// Source → sheet pairings, synced in order.
    pub syncs: Vec<SyncConfig>,
}

impl Settings {
    /// Load and validate settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the file does not exist, or
    /// [`Error::Config`] if it cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotInitialized);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Write settings atomically, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {e}")))?;

        atomic_write(path, &(content + "\n"))
            .map_err(|e| Error::Config(format!("Failed to write {}: {e}", path.display())))
    }

    /// Directory of source files for settings loaded from `config_path`.
    #[must_use]
    pub fn source_dir(&self, config_path: &Path) -> PathBuf {
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        match &self.source_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.join(DEFAULT_SOURCE_DIR),
        }
    }

    /// Check invariants the driver relies on.
    ///
    /// Checkpoints are keyed by source identity, so two configs may not
    /// share a source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.options.check().map_err(Error::Config)?;

        let mut seen = HashSet::new();
        for (i, config) in self.syncs.iter().enumerate() {
            if config.store.trim().is_empty() {
                return Err(Error::Config(format!("syncs[{i}]: store must not be empty")));
            }
            if !seen.insert(config.source.as_str()) {
                return Err(Error::Config(format!(
                    "syncs[{i}]: source '{}' is configured more than once",
                    config.source
                )));
            }
        }
        Ok(())
    }
}

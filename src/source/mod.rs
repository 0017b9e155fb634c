//! Local record sources.
//!
//! Each source identity maps to `<source_dir>/<identity>.jsonl`, one
//! [`SourceRecord`] per line. [`LocalConnector`] pairs those files with
//! sheets in a [`SqliteStorage`] database.

pub mod file;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{SourceRecord, SyncConfig};
use crate::storage::SqliteStorage;
use crate::sync::{Connected, Connector, SourceProvider, SyncResult};

pub use file::{atomic_write, count_lines, read_jsonl};

/// File extension for source files.
pub const SOURCE_EXTENSION: &str = "jsonl";

/// Path of the file backing a source identity, or `None` if the identity
/// cannot name a file inside `dir`.
#[must_use]
pub fn source_path(dir: &Path, source: &str) -> Option<PathBuf> {
    let source = source.trim();
    let valid = !source.is_empty()
        && source != "."
        && source != ".."
        && !source.contains(['/', '\\', '\0']);
    valid.then(|| dir.join(format!("{source}.{SOURCE_EXTENSION}")))
}

/// Records read from a JSONL file on every query.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceProvider for JsonlSource {
    fn records(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<Vec<SourceRecord>> {
        let all: Vec<SourceRecord> = read_jsonl(&self.path)?;
        let total = all.len();
        let records: Vec<_> = all
            .into_iter()
            .filter(|r| r.start <= end && r.end >= start)
            .collect();
        debug!(path = %self.path.display(), total, matched = records.len(), "Read source file");
        Ok(records)
    }
}

/// Connects configs to JSONL files and SQLite sheets.
pub struct LocalConnector<'s> {
    dir: PathBuf,
    storage: &'s SqliteStorage,
}

impl<'s> LocalConnector<'s> {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, storage: &'s SqliteStorage) -> Self {
        Self {
            dir: dir.into(),
            storage,
        }
    }
}

impl Connector for LocalConnector<'_> {
    fn connect(&mut self, config: &SyncConfig) -> SyncResult<Connected<'_>> {
        let Some(path) = source_path(&self.dir, &config.source) else {
            return Ok(Connected::Missing {
                reason: format!("'{}' is not a valid source identity", config.source),
            });
        };
        if !path.is_file() {
            return Ok(Connected::Missing {
                reason: format!("no source file at {}", path.display()),
            });
        }

        Ok(Connected::Ready {
            source: Box::new(JsonlSource::new(path)),
            store: Box::new(self.storage.sheet(&config.store)),
        })
    }
}

//! Sync result and statistics types.
//!
//! Reconciliation passes report what they did through [`ReconcileStats`];
//! the windowed driver aggregates those into a [`SyncReport`] per config and
//! tags the overall result as applied or skipped via [`SyncOutcome`].

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Statistics for one reconciliation pass (or a sum of passes).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Rows appended for records seen for the first time.
    pub inserted: usize,
    /// Rows rewritten in place because a schema column changed.
    pub updated: usize,
    /// Rows that already matched their record.
    pub unchanged: usize,
    /// Rows removed because their record disappeared inside the window.
    pub deleted: usize,
    /// Rows with no upstream record that were kept (out of window or unparsable).
    pub protected: usize,
}

impl ReconcileStats {
    /// Number of store mutations issued for rows (header writes excluded).
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }

    /// Returns true if nothing was written.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.writes() == 0
    }

    /// Accumulate another pass into this one.
    pub fn merge(&mut self, other: &Self) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.deleted += other.deleted;
        self.protected += other.protected;
    }
}

/// What happened for a single config.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Source identity
    pub source: String,
    /// Store identity
    pub store: String,
    /// Number of windows reconciled
    pub windows: u32,
    /// Summed statistics across windows
    pub stats: ReconcileStats,
    /// Checkpoint after the run
    pub checkpoint: DateTime<Utc>,
    /// True when the iteration cap stopped the run before catching up.
    pub capped: bool,
}

/// Tagged result of a sync request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Windows were reconciled (possibly zero, when already caught up).
    Applied(SyncReport),
    /// Nothing was attempted.
    Skipped { source: String, reason: String },
}

impl SyncOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    #[must_use]
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Applied(report) => Some(report),
            Self::Skipped { .. } => None,
        }
    }
}

/// A config that failed inside a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub source: String,
    pub store: String,
    pub error: String,
}

/// Result of `sync_all`: per-config outcomes plus isolated failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<SyncOutcome>,
    pub failures: Vec<SyncFailure>,
}

impl BatchReport {
    /// Returns true if every config either applied or was skipped.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Summed statistics over every applied config.
    #[must_use]
    pub fn totals(&self) -> ReconcileStats {
        let mut total = ReconcileStats::default();
        for report in self.outcomes.iter().filter_map(SyncOutcome::report) {
            total.merge(&report.stats);
        }
        total
    }
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// The source provider failed.
    #[error("Source error: {0}")]
    Source(String),

    /// The tabular store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Checkpoint persistence failed.
    #[error("Property store error: {0}")]
    Property(String),

    /// Invalid record format.
    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord {
        /// Line number (1-indexed).
        line: usize,
        /// Error message.
        message: String,
    },

    /// A timestamp argument could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// No config matches the requested target.
    #[error("Unknown sync config: {0}")]
    UnknownConfig(String),
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

//! Error types for the calsheet CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, 6=sync, ...)
//! - Retryability flags
//! - Recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Result type alias for calsheet operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    ConfigNotFound,
    SheetNotFound,
    CheckpointNotFound,

    // Validation (exit 4)
    InvalidArgument,
    InvalidTimestamp,

    // Sync (exit 6)
    SourceError,
    StoreError,
    SyncFailed,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::SheetNotFound => "SHEET_NOT_FOUND",
            Self::CheckpointNotFound => "CHECKPOINT_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::SourceError => "SOURCE_ERROR",
            Self::StoreError => "STORE_ERROR",
            Self::SyncFailed => "SYNC_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::ConfigNotFound | Self::SheetNotFound | Self::CheckpointNotFound => 3,
            Self::InvalidArgument | Self::InvalidTimestamp => 4,
            Self::SourceError | Self::StoreError | Self::SyncFailed => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether retrying (with corrected input, or later) may succeed.
    ///
    /// True for validation errors and for source/store/database failures,
    /// which are usually transient. A failed sync never advanced its
    /// checkpoint, so rerunning it is always safe.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument
                | Self::InvalidTimestamp
                | Self::SourceError
                | Self::StoreError
                | Self::SyncFailed
                | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in calsheet operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `calsheet init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Sync config not found: {selector}")]
    ConfigNotFound { selector: String },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("No checkpoint stored for {source_id}")]
    CheckpointNotFound { source_id: String },

    #[error("{failed} of {total} syncs failed")]
    SyncFailed { failed: usize, total: usize },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Sync(SyncError),

    #[error("{0}")]
    Other(String),
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Io(e) => Self::Io(e),
            SyncError::Json(e) => Self::Json(e),
            SyncError::InvalidTimestamp(s) => Self::InvalidTimestamp(s),
            SyncError::UnknownConfig(selector) => Self::ConfigNotFound { selector },
            other => Self::Sync(other),
        }
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Self::SheetNotFound { .. } => ErrorCode::SheetNotFound,
            Self::CheckpointNotFound { .. } => ErrorCode::CheckpointNotFound,
            Self::SyncFailed { .. } => ErrorCode::SyncFailed,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidTimestamp(_) => ErrorCode::InvalidTimestamp,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Sync(inner) => match inner {
                SyncError::Source(_) | SyncError::InvalidRecord { .. } => ErrorCode::SourceError,
                SyncError::Store(_) | SyncError::Property(_) => ErrorCode::StoreError,
                SyncError::Database(_) => ErrorCode::DatabaseError,
                SyncError::Io(_) => ErrorCode::IoError,
                SyncError::Json(_) => ErrorCode::JsonError,
                SyncError::InvalidTimestamp(_) => ErrorCode::InvalidTimestamp,
                SyncError::UnknownConfig(_) => ErrorCode::ConfigNotFound,
            },
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Recovery hint for humans and scripts.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `calsheet init` to create the settings file and database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Settings already exist at {}. Use `--force` to overwrite.",
                path.display()
            )),

            Self::ConfigNotFound { selector } => Some(format!(
                "No sync config matches '{selector}'. Use `calsheet status` to list configs by index and source."
            )),

            Self::SheetNotFound { .. } => {
                Some("Use `calsheet status` to list sheets that hold rows.".to_string())
            }

            Self::CheckpointNotFound { .. } => Some(
                "The next sync for this source starts from the epoch. \
                 Use `calsheet checkpoint set` to start later."
                    .to_string(),
            ),

            Self::InvalidTimestamp(_) => Some(
                "Use RFC 3339 (2026-02-03T09:00:00Z) or a plain date (2026-02-03)".to_string(),
            ),

            Self::SyncFailed { .. } => Some(
                "Failed syncs keep their checkpoint; rerun `calsheet sync` to retry them. \
                 Use -v for details."
                    .to_string(),
            ),

            Self::Sync(SyncError::InvalidRecord { .. }) => {
                Some("Fix or remove the offending line in the source file".to_string())
            }

            Self::Config(_) => Some(
                "Check the settings file, or pass --config to use a different one".to_string(),
            ),

            Self::Database(_) | Self::Io(_) | Self::Json(_) | Self::InvalidArgument(_)
            | Self::Sync(_) | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

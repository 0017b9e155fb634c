//! Per-source sync checkpoints.
//!
//! A checkpoint is the upper bound of the last window that was fully
//! reconciled for a source. It is stored as Unix epoch milliseconds in a
//! [`PropertyStore`]. A missing or unreadable value means "never synced"
//! and resolves to the epoch, so corrupted state heals itself on the next run.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::sync::store::PropertyStore;
use crate::sync::types::SyncResult;

/// Key prefix for checkpoint properties.
pub const CHECKPOINT_KEY: &str = "calsheet.checkpoint";

/// Property key for a source identity.
#[must_use]
pub fn checkpoint_key(source: &str) -> String {
    let source = source.trim();
    if source.is_empty() {
        CHECKPOINT_KEY.to_string()
    } else {
        format!("{CHECKPOINT_KEY}.{source}")
    }
}

/// Parse a stored checkpoint value.
fn parse_checkpoint(raw: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = raw.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Checkpoint access on top of a property store.
pub struct CheckpointStore<'a> {
    properties: &'a mut dyn PropertyStore,
}

impl<'a> CheckpointStore<'a> {
    #[must_use]
    pub fn new(properties: &'a mut dyn PropertyStore) -> Self {
        Self { properties }
    }

    /// Last synced upper bound, or the epoch when absent or invalid.
    ///
    /// # Errors
    ///
    /// Returns an error only if the property store itself fails.
    pub fn get(&self, source: &str) -> SyncResult<DateTime<Utc>> {
        let key = checkpoint_key(source);
        let Some(raw) = self.properties.get_property(&key)? else {
            debug!(source, "No checkpoint, starting from epoch");
            return Ok(DateTime::UNIX_EPOCH);
        };

        match parse_checkpoint(&raw) {
            Some(ts) => Ok(ts),
            None => {
                warn!(source, value = %raw, "Ignoring invalid checkpoint, starting from epoch");
                Ok(DateTime::UNIX_EPOCH)
            }
        }
    }

    /// Stored checkpoint, if present and valid.
    ///
    /// # Errors
    ///
    /// Returns an error only if the property store itself fails.
    pub fn peek(&self, source: &str) -> SyncResult<Option<DateTime<Utc>>> {
        let raw = self.properties.get_property(&checkpoint_key(source))?;
        Ok(raw.as_deref().and_then(parse_checkpoint))
    }

    /// Persist a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the property store fails.
    pub fn set(&mut self, source: &str, ts: DateTime<Utc>) -> SyncResult<()> {
        self.properties
            .set_property(&checkpoint_key(source), &ts.timestamp_millis().to_string())
    }

    /// Persist a checkpoint unless a later one is already stored.
    ///
    /// Returns the value now in effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the property store fails.
    pub fn advance(&mut self, source: &str, ts: DateTime<Utc>) -> SyncResult<DateTime<Utc>> {
        match self.peek(source)? {
            Some(current) if current >= ts => Ok(current),
            _ => {
                self.set(source, ts)?;
                Ok(ts)
            }
        }
    }

    /// Forget a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the property store fails.
    pub fn clear(&mut self, source: &str) -> SyncResult<()> {
        self.properties.delete_property(&checkpoint_key(source))
    }
}

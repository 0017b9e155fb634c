//! Sync history.
//!
//! Every sync, resync and manual checkpoint change is recorded as an event
//! so `calsheet status` can show when each source last ran and how it went.

use rusqlite::{Connection, Result};
use serde::Serialize;

/// Event types for the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SyncApplied,
    SyncSkipped,
    SyncFailed,
    ResyncApplied,
    CheckpointSet,
    CheckpointCleared,
}

impl EventType {
    /// String representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SyncApplied => "sync_applied",
            Self::SyncSkipped => "sync_skipped",
            Self::SyncFailed => "sync_failed",
            Self::ResyncApplied => "resync_applied",
            Self::CheckpointSet => "checkpoint_set",
            Self::CheckpointCleared => "checkpoint_cleared",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "sync_applied" => Some(Self::SyncApplied),
            "sync_skipped" => Some(Self::SyncSkipped),
            "sync_failed" => Some(Self::SyncFailed),
            "resync_applied" => Some(Self::ResyncApplied),
            "checkpoint_set" => Some(Self::CheckpointSet),
            "checkpoint_cleared" => Some(Self::CheckpointCleared),
            _ => None,
        }
    }
}

/// A history record.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i64,
    pub source: String,
    pub store: Option<String>,
    pub event_type: EventType,
    /// JSON payload (stats, error message or checkpoint value).
    pub detail: Option<String>,
    pub created_at: i64,
}

impl Event {
    /// Create a new event (id will be assigned by database).
    #[must_use]
    pub fn new(source: &str, event_type: EventType) -> Self {
        Self {
            id: 0,
            source: source.to_string(),
            store: None,
            event_type,
            detail: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: &str) -> Self {
        self.store = Some(store.to_string());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Insert an event into the database.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(conn: &Connection, event: &Event) -> Result<i64> {
    conn.execute(
        "INSERT INTO events (source, store, event_type, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            event.source,
            event.store,
            event.event_type.as_str(),
            event.detail,
            event.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent events, newest first, optionally for one source.
///
/// Rows with an unknown event type are skipped.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_events(conn: &Connection, source: Option<&str>, limit: Option<u32>) -> Result<Vec<Event>> {
    let limit = limit.unwrap_or(100);
    let mut stmt = conn.prepare(
        "SELECT id, source, store, event_type, detail, created_at
         FROM events
         WHERE ?1 IS NULL OR source = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(rusqlite::params![source, limit], |row| {
        let event_type: String = row.get(3)?;
        let Some(event_type) = EventType::parse(&event_type) else {
            return Ok(None);
        };
        Ok(Some(Event {
            id: row.get(0)?,
            source: row.get(1)?,
            store: row.get(2)?,
            event_type,
            detail: row.get(4)?,
            created_at: row.get(5)?,
        }))
    })?;

    let mut events = Vec::new();
    for event in rows {
        if let Some(event) = event? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Latest event per source.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_event(conn: &Connection, source: &str) -> Result<Option<Event>> {
    Ok(get_events(conn, Some(source), Some(1))?.into_iter().next())
}

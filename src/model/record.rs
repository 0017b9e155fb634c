//! Source record model.
//!
//! A source record is one calendar event as the source provider reports it.
//! The sync engine never writes to records; it only projects them into rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped event from a source provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Stable identifier, unique within the source.
    pub id: String,

    /// Event title (user controlled, sanitized on projection)
    #[serde(default)]
    pub title: String,

    /// Start instant
    pub start: DateTime<Utc>,

    /// End instant
    pub end: DateTime<Utc>,

    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Participants; `None` when the source omits the guest list entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,

    /// Tags used by the per-config record filter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl SourceRecord {
    /// Create a record with only the required fields set.
    #[must_use]
    pub fn new(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            start,
            end,
            description: None,
            location: None,
            participants: None,
            tags: Vec::new(),
        }
    }

    /// Whether this record passes the given filter tag.
    ///
    /// A missing or empty filter matches every record.
    #[must_use]
    pub fn matches_filter(&self, filter: Option<&str>) -> bool {
        match filter {
            None => true,
            Some(tag) if tag.trim().is_empty() => true,
            Some(tag) => self.tags.iter().any(|t| t == tag),
        }
    }
}

/// An event participant.
///
/// Sources report guests either as a bare identifier or as an object with
/// an email address and an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Participant {
    /// Bare identifier (usually an email address)
    Id(String),
    /// Guest object
    Guest {
        email: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Participant {
    /// The identifier written to the sheet.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Guest { email, .. } => email,
        }
    }
}

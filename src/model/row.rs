//! Sheet cell and row model.
//!
//! A [`Row`] is an ordered list of [`Cell`]s at a 1-based position in a sheet.
//! The first [`SCHEMA_COLUMNS`] cells follow the fixed schema; anything after
//! that belongs to whoever added it and is never rewritten by the sync engine.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Number of columns owned by the sync engine.
pub const SCHEMA_COLUMNS: usize = 7;

/// Header labels, in column order.
pub const HEADER: [&str; SCHEMA_COLUMNS] = [
    "id",
    "title",
    "start",
    "end",
    "description",
    "location",
    "attendees",
];

/// Column offsets into a row (0-based).
pub mod col {
    pub const ID: usize = 0;
    pub const TITLE: usize = 1;
    pub const START: usize = 2;
    pub const END: usize = 3;
    pub const DESCRIPTION: usize = 4;
    pub const LOCATION: usize = 5;
    pub const PARTICIPANTS: usize = 6;
}

/// A single scalar sheet value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A date-typed cell, as spreadsheets return for auto-parsed timestamps.
    Date(DateTime<Utc>),
}

/// An ordered tuple of cells.
pub type Row = Vec<Cell>;

impl Cell {
    /// Convenience constructor for text cells.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// The text content, if this is a text cell.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the cell is "falsy" the way spreadsheet scripts treat it.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(n) => *n == 0.0 || n.is_nan(),
            Self::Bool(b) => !b,
            Self::Date(_) => false,
        }
    }

    /// Parse the cell as an instant.
    ///
    /// Date cells convert directly; text cells must hold an RFC 3339 string.
    #[must_use]
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(dt) => Some(*dt),
            Self::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Render the cell as display text (used for keys, CSV and tables).
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    #[allow(clippy::cast_possible_truncation)]
                    let whole = *n as i64;
                    whole.to_string()
                } else {
                    n.to_string()
                }
            }
            Self::Bool(b) => b.to_string(),
            Self::Date(dt) => to_iso(dt),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
#[must_use]
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The header row as cells.
#[must_use]
pub fn header_row() -> Row {
    HEADER.iter().map(|h| Cell::from(*h)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_is_blank() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::text("").is_blank());
        assert!(Cell::Number(0.0).is_blank());
        assert!(Cell::Bool(false).is_blank());
        assert!(!Cell::text("e1").is_blank());
        assert!(!Cell::Number(12.0).is_blank());
    }

    #[test]
    fn test_as_instant() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap();
        assert_eq!(Cell::Date(dt).as_instant(), Some(dt));
        assert_eq!(Cell::text("2026-02-02T10:00:00.000Z").as_instant(), Some(dt));
        assert_eq!(Cell::text("not a date").as_instant(), None);
        assert_eq!(Cell::Number(5.0).as_instant(), None);
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(Cell::Number(42.0).display(), "42");
        assert_eq!(Cell::Number(1.5).display(), "1.5");
    }

    #[test]
    fn test_to_iso_millis() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap();
        assert_eq!(to_iso(&dt), "2026-02-02T10:00:00.000Z");
    }

    #[test]
    fn test_cell_serde_shape() {
        let json = serde_json::to_string(&vec![Cell::text("a"), Cell::Empty]).unwrap();
        assert_eq!(json, r#"[{"text":"a"},"empty"]"#);
    }
}

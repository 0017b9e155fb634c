//! Projection of source records into sheet rows.

use crate::model::{Cell, Participant, Row, SourceRecord, to_iso};
use crate::sync::sanitize::sanitize_str;

/// Map a record to its 7-cell schema row.
///
/// Optional text fields become empty strings and a missing participant list
/// becomes an empty string, so the result never contains [`Cell::Empty`].
#[must_use]
pub fn project(record: &SourceRecord) -> Row {
    let participants = record
        .participants
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(Participant::identifier)
        .collect::<Vec<_>>()
        .join(",");

    vec![
        Cell::text(record.id.as_str()),
        Cell::text(sanitize_str(&record.title)),
        Cell::text(to_iso(&record.start)),
        Cell::text(to_iso(&record.end)),
        Cell::text(sanitize_str(record.description.as_deref().unwrap_or_default())),
        Cell::text(sanitize_str(record.location.as_deref().unwrap_or_default())),
        Cell::text(participants),
    ]
}

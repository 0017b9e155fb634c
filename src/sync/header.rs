//! Header row maintenance.

use tracing::{debug, info};

use crate::model::{Cell, HEADER, SCHEMA_COLUMNS, header_row};
use crate::sync::store::TabularStore;
use crate::sync::types::SyncResult;

/// Number of leading header cells that must match for the header to count.
const HEADER_KEY_COLUMNS: usize = 4;

/// What [`ensure_header`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    /// The sheet was empty; the header was written at row 1.
    Written,
    /// Row 1 held data; a row was inserted above it for the header.
    Inserted,
    /// The header was already in place.
    Present,
}

/// Make sure row 1 is the header, without moving or losing data rows.
///
/// Must run before the sheet is indexed in the same pass; otherwise the
/// first data row could be mistaken for a header.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub fn ensure_header(store: &mut dyn TabularStore) -> SyncResult<HeaderAction> {
    let rows = store.read_all()?;
    let header = header_row();

    let Some(first) = rows.first() else {
        store.write_range(1, 1, SCHEMA_COLUMNS, &header)?;
        info!("Wrote header to empty sheet");
        return Ok(HeaderAction::Written);
    };

    if is_header(first) {
        debug!("Header present");
        return Ok(HeaderAction::Present);
    }

    store.insert_row_before(1)?;
    store.write_range(1, 1, SCHEMA_COLUMNS, &header)?;
    info!(data_rows = rows.len(), "Inserted header above existing rows");
    Ok(HeaderAction::Inserted)
}

/// Whether a row starts with the key header labels.
#[must_use]
pub fn is_header(row: &[Cell]) -> bool {
    row.len() >= HEADER_KEY_COLUMNS
        && HEADER[..HEADER_KEY_COLUMNS]
            .iter()
            .zip(row)
            .all(|(label, cell)| cell.as_text() == Some(*label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::storage::memory::MemorySheet;

    fn data_row(id: &str) -> Row {
        vec![Cell::text(id), Cell::text("title")]
    }

    #[test]
    fn test_writes_header_on_empty_sheet() {
        let mut sheet = MemorySheet::default();

        let action = ensure_header(&mut sheet).unwrap();

        assert_eq!(action, HeaderAction::Written);
        assert_eq!(sheet.rows(), &[header_row()]);
    }

    #[test]
    fn test_inserts_header_above_data() {
        let mut sheet = MemorySheet::with_rows(vec![data_row("e1"), data_row("e2")]);

        let action = ensure_header(&mut sheet).unwrap();

        assert_eq!(action, HeaderAction::Inserted);
        let rows = sheet.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], header_row());
        assert_eq!(rows[1], data_row("e1"));
        assert_eq!(rows[2], data_row("e2"));
    }

    #[test]
    fn test_existing_header_is_left_alone() {
        let mut custom = header_row();
        custom[5] = Cell::text("where");
        custom.push(Cell::text("my column"));
        let mut sheet = MemorySheet::with_rows(vec![custom.clone(), data_row("e1")]);

        let action = ensure_header(&mut sheet).unwrap();

        assert_eq!(action, HeaderAction::Present);
        assert_eq!(sheet.rows()[0], custom);
        assert_eq!(sheet.writes(), 0);
    }

    #[test]
    fn test_partial_header_is_not_a_header() {
        let row = vec![Cell::text("id"), Cell::text("title"), Cell::text("start")];
        assert!(!is_header(&row));
        assert!(is_header(&header_row()));
    }
}

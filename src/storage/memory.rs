//! In-memory stores.
//!
//! These back the sync engine in tests and dry runs. They follow the same
//! positional semantics as the SQLite sheet: writing past the last row
//! creates the missing rows, and deletes/inserts shift later rows.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::model::{Cell, Row, SourceRecord, SyncConfig};
use crate::sync::{
    Connected, Connector, PropertyStore, SourceProvider, SyncError, SyncResult, TabularStore,
};

/// A sheet held in a `Vec`.
#[derive(Debug, Default, Clone)]
pub struct MemorySheet {
    rows: Vec<Row>,
    writes: usize,
    deleted: Vec<usize>,
    fail_writes: bool,
}

impl MemorySheet {
    #[must_use]
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// A sheet that rejects every mutation.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of mutating calls received.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Positions passed to `delete_row`, in call order.
    #[must_use]
    pub fn deleted_positions(&self) -> &[usize] {
        &self.deleted
    }

    fn begin_write(&mut self) -> SyncResult<()> {
        if self.fail_writes {
            return Err(SyncError::Store("sheet is read-only".to_string()));
        }
        self.writes += 1;
        Ok(())
    }

    fn check_position(row_position: usize) -> SyncResult<usize> {
        row_position
            .checked_sub(1)
            .ok_or_else(|| SyncError::Store("row positions start at 1".to_string()))
    }
}

impl TabularStore for MemorySheet {
    fn read_all(&self) -> SyncResult<Vec<Row>> {
        Ok(self.rows.clone())
    }

    fn append_row(&mut self, row: &Row) -> SyncResult<()> {
        self.begin_write()?;
        self.rows.push(row.clone());
        Ok(())
    }

    fn write_range(
        &mut self,
        row_position: usize,
        col_start: usize,
        num_cols: usize,
        values: &Row,
    ) -> SyncResult<()> {
        let index = Self::check_position(row_position)?;
        let col = Self::check_position(col_start)?;
        self.begin_write()?;

        if self.rows.len() <= index {
            self.rows.resize_with(index + 1, Vec::new);
        }
        let row = &mut self.rows[index];
        if row.len() < col + num_cols {
            row.resize(col + num_cols, Cell::Empty);
        }
        for offset in 0..num_cols {
            row[col + offset] = values.get(offset).cloned().unwrap_or_default();
        }
        Ok(())
    }

    fn delete_row(&mut self, row_position: usize) -> SyncResult<()> {
        let index = Self::check_position(row_position)?;
        if index >= self.rows.len() {
            return Err(SyncError::Store(format!("row {row_position} does not exist")));
        }
        self.begin_write()?;
        self.rows.remove(index);
        self.deleted.push(row_position);
        Ok(())
    }

    fn insert_row_before(&mut self, row_position: usize) -> SyncResult<()> {
        let index = Self::check_position(row_position)?;
        self.begin_write()?;
        if index >= self.rows.len() {
            self.rows.resize_with(index + 1, Vec::new);
        } else {
            self.rows.insert(index, Vec::new());
        }
        Ok(())
    }

    fn clear_below_header(&mut self) -> SyncResult<()> {
        if self.rows.len() > 1 {
            self.begin_write()?;
            self.rows.truncate(1);
        }
        Ok(())
    }
}

/// Property store held in a map.
#[derive(Debug, Default, Clone)]
pub struct MemoryProperties {
    values: BTreeMap<String, String>,
}

impl MemoryProperties {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl PropertyStore for MemoryProperties {
    fn get_property(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set_property(&mut self, key: &str, value: &str) -> SyncResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_property(&mut self, key: &str) -> SyncResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// A fixed list of records, optionally failing on every query.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    records: Vec<SourceRecord>,
    fail: bool,
    queries: RefCell<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl MemorySource {
    #[must_use]
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// A source that is unreachable.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Ranges queried so far, in call order.
    #[must_use]
    pub fn queries(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        self.queries.borrow().clone()
    }

    pub fn records_mut(&mut self) -> &mut Vec<SourceRecord> {
        &mut self.records
    }
}

impl SourceProvider for MemorySource {
    fn records(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<Vec<SourceRecord>> {
        self.queries.borrow_mut().push((start, end));
        if self.fail {
            return Err(SyncError::Source("source unavailable".to_string()));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.start <= end && r.end >= start)
            .cloned()
            .collect())
    }
}

/// Connector over in-memory sources and sheets, keyed by identity.
///
/// Sheets are created on first use; a config whose source is unknown is
/// reported as missing.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    pub sources: HashMap<String, MemorySource>,
    pub sheets: HashMap<String, MemorySheet>,
}

impl MemoryConnector {
    pub fn add_source(&mut self, id: &str, source: MemorySource) {
        self.sources.insert(id.to_string(), source);
    }

    pub fn add_sheet(&mut self, id: &str, sheet: MemorySheet) {
        self.sheets.insert(id.to_string(), sheet);
    }

    #[must_use]
    pub fn sheet(&self, id: &str) -> Option<&MemorySheet> {
        self.sheets.get(id)
    }

    #[must_use]
    pub fn source(&self, id: &str) -> Option<&MemorySource> {
        self.sources.get(id)
    }
}

impl Connector for MemoryConnector {
    fn connect(&mut self, config: &SyncConfig) -> SyncResult<Connected<'_>> {
        let Some(source) = self.sources.get(&config.source) else {
            return Ok(Connected::Missing {
                reason: format!("no source named '{}'", config.source),
            });
        };
        let sheet = self.sheets.entry(config.store.clone()).or_default();

        Ok(Connected::Ready {
            source: Box::new(source),
            store: Box::new(sheet),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    #[test]
    fn test_write_range_preserves_cells_outside_range() {
        let mut sheet = MemorySheet::with_rows(vec![row(&["a", "b", "c", "d"])]);

        sheet.write_range(1, 2, 2, &row(&["B", "C"])).unwrap();

        assert_eq!(sheet.rows()[0], row(&["a", "B", "C", "d"]));
    }

    #[test]
    fn test_write_range_past_end_creates_rows() {
        let mut sheet = MemorySheet::default();

        sheet.write_range(2, 1, 1, &row(&["x"])).unwrap();

        assert_eq!(sheet.rows().len(), 2);
        assert!(sheet.rows()[0].is_empty());
    }

    #[test]
    fn test_delete_and_insert_shift_rows() {
        let mut sheet = MemorySheet::with_rows(vec![row(&["1"]), row(&["2"]), row(&["3"])]);

        sheet.delete_row(2).unwrap();
        assert_eq!(sheet.rows(), &[row(&["1"]), row(&["3"])]);

        sheet.insert_row_before(1).unwrap();
        assert_eq!(sheet.rows(), &[Vec::new(), row(&["1"]), row(&["3"])]);

        assert!(sheet.delete_row(9).is_err());
        assert!(sheet.delete_row(0).is_err());
    }

    #[test]
    fn test_failing_sheet_rejects_writes() {
        let mut sheet = MemorySheet::failing();
        assert!(matches!(
            sheet.append_row(&row(&["x"])),
            Err(SyncError::Store(_))
        ));
    }

    #[test]
    fn test_source_filters_by_overlap() {
        use chrono::TimeZone;
        let t = |h| Utc.with_ymd_and_hms(2026, 2, 2, h, 0, 0).unwrap();
        let source = MemorySource::new(vec![
            SourceRecord::new("early", "", t(1), t(2)),
            SourceRecord::new("spans", "", t(3), t(6)),
            SourceRecord::new("late", "", t(8), t(9)),
        ]);

        let ids: Vec<_> = source
            .records(t(4), t(7))
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec!["spans"]);
        assert_eq!(source.queries(), vec![(t(4), t(7))]);
    }
}

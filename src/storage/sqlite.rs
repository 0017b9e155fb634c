//! SQLite storage implementation.
//!
//! Holds checkpoints (as properties), sheets and sync history in one
//! database. Sheets are addressed by 1-based row position; inserts and
//! deletes renumber later rows inside a transaction so positions stay dense.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::model::{Cell, Row};
use crate::storage::events::{Event, get_events, insert_event, last_event};
use crate::storage::schema::apply_schema;
use crate::sync::{PropertyStore, SyncError, SyncResult, TabularStore};

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Row count per sheet.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
    pub updated_at: Option<i64>,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        let timeout = timeout_ms.map_or(Duration::from_secs(5), Duration::from_millis);
        conn.busy_timeout(timeout)?;

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Property store view.
    #[must_use]
    pub fn properties(&self) -> SqliteProperties<'_> {
        SqliteProperties { conn: &self.conn }
    }

    /// Sheet view; the sheet exists once a row is written to it.
    #[must_use]
    pub fn sheet(&self, name: &str) -> SqliteSheet<'_> {
        SqliteSheet {
            conn: &self.conn,
            name: name.to_string(),
        }
    }

    /// Every sheet holding at least one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_sheets(&self) -> Result<Vec<SheetSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT sheet, COUNT(*), MAX(updated_at) FROM sheet_rows GROUP BY sheet ORDER BY sheet",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SheetSummary {
                name: row.get(0)?,
                rows: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Properties whose key starts with `prefix`, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn properties_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM properties WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let rows = stmt.query_map([prefix], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Append a history event.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn record_event(&self, event: &Event) -> Result<i64> {
        Ok(insert_event(&self.conn, event)?)
    }

    /// Recent history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn recent_events(&self, source: Option<&str>, limit: u32) -> Result<Vec<Event>> {
        Ok(get_events(&self.conn, source, Some(limit))?)
    }

    /// Latest history event for a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_event(&self, source: &str) -> Result<Option<Event>> {
        Ok(last_event(&self.conn, source)?)
    }
}

/// Checkpoint properties stored in the `properties` table.
pub struct SqliteProperties<'a> {
    conn: &'a Connection,
}

impl PropertyStore for SqliteProperties<'_> {
    fn get_property(&self, key: &str) -> SyncResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM properties WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_property(&mut self, key: &str, value: &str) -> SyncResult<()> {
        self.conn.execute(
            "INSERT INTO properties (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn delete_property(&mut self, key: &str) -> SyncResult<()> {
        self.conn
            .execute("DELETE FROM properties WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// A sheet stored in `sheet_rows`.
pub struct SqliteSheet<'a> {
    conn: &'a Connection,
    name: String,
}

impl SqliteSheet<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Highest row position, 0 for an empty sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn row_count(&self) -> SyncResult<usize> {
        let count: usize = self.conn.query_row(
            "SELECT COALESCE(MAX(position), 0) FROM sheet_rows WHERE sheet = ?1",
            [&self.name],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn read_row(conn: &Connection, sheet: &str, position: usize) -> SyncResult<Option<Row>> {
        let cells: Option<String> = conn
            .query_row(
                "SELECT cells FROM sheet_rows WHERE sheet = ?1 AND position = ?2",
                rusqlite::params![sheet, position],
                |row| row.get(0),
            )
            .optional()?;
        cells.map(|c| decode_row(&c)).transpose()
    }

    fn upsert_row(conn: &Connection, sheet: &str, position: usize, row: &Row) -> SyncResult<()> {
        conn.execute(
            "INSERT INTO sheet_rows (sheet, position, cells, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(sheet, position) DO UPDATE SET cells = excluded.cells, updated_at = excluded.updated_at",
            rusqlite::params![
                sheet,
                position,
                serde_json::to_string(row)?,
                Utc::now().timestamp_millis()
            ],
        )?;
        Ok(())
    }

    /// Fill positions `from..=to` with empty rows.
    fn pad_rows(conn: &Connection, sheet: &str, from: usize, to: usize) -> SyncResult<()> {
        for position in from..=to {
            Self::upsert_row(conn, sheet, position, &Vec::new())?;
        }
        Ok(())
    }

    /// Move every row at or after `from` by `delta` positions.
    ///
    /// Positions pass through negative values so no intermediate state
    /// collides with the primary key.
    fn shift_rows(conn: &Connection, sheet: &str, from: usize, delta: i64) -> SyncResult<()> {
        conn.execute(
            "UPDATE sheet_rows SET position = -(position + ?3) WHERE sheet = ?1 AND position >= ?2",
            rusqlite::params![sheet, from, delta],
        )?;
        conn.execute(
            "UPDATE sheet_rows SET position = -position WHERE sheet = ?1 AND position < 0",
            [sheet],
        )?;
        Ok(())
    }
}

fn decode_row(cells: &str) -> SyncResult<Row> {
    Ok(serde_json::from_str(cells)?)
}

impl TabularStore for SqliteSheet<'_> {
    fn read_all(&self) -> SyncResult<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare("SELECT position, cells FROM sheet_rows WHERE sheet = ?1 ORDER BY position")?;
        let stored = stmt
            .query_map([&self.name], |row| {
                Ok((row.get::<_, usize>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(stored.len());
        for (position, cells) in stored {
            // Gaps read as blank rows.
            while rows.len() + 1 < position {
                rows.push(Vec::new());
            }
            rows.push(decode_row(&cells)?);
        }
        Ok(rows)
    }

    fn append_row(&mut self, row: &Row) -> SyncResult<()> {
        let position = self.row_count()? + 1;
        Self::upsert_row(self.conn, &self.name, position, row)
    }

    fn write_range(
        &mut self,
        row_position: usize,
        col_start: usize,
        num_cols: usize,
        values: &Row,
    ) -> SyncResult<()> {
        if row_position == 0 || col_start == 0 {
            return Err(SyncError::Store("row and column positions start at 1".to_string()));
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut row = match Self::read_row(&tx, &self.name, row_position)? {
            Some(row) => row,
            None => {
                let count = self.row_count()?;
                if row_position > count + 1 {
                    Self::pad_rows(&tx, &self.name, count + 1, row_position - 1)?;
                }
                Vec::new()
            }
        };

        let col = col_start - 1;
        if row.len() < col + num_cols {
            row.resize(col + num_cols, Cell::Empty);
        }
        for offset in 0..num_cols {
            row[col + offset] = values.get(offset).cloned().unwrap_or_default();
        }

        Self::upsert_row(&tx, &self.name, row_position, &row)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_row(&mut self, row_position: usize) -> SyncResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted = tx.execute(
            "DELETE FROM sheet_rows WHERE sheet = ?1 AND position = ?2",
            rusqlite::params![self.name, row_position],
        )?;
        if deleted == 0 {
            return Err(SyncError::Store(format!(
                "row {row_position} does not exist in sheet '{}'",
                self.name
            )));
        }
        Self::shift_rows(&tx, &self.name, row_position + 1, -1)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_row_before(&mut self, row_position: usize) -> SyncResult<()> {
        if row_position == 0 {
            return Err(SyncError::Store("row positions start at 1".to_string()));
        }

        let tx = self.conn.unchecked_transaction()?;
        let count = self.row_count()?;
        if row_position > count {
            Self::pad_rows(&tx, &self.name, count + 1, row_position)?;
        } else {
            Self::shift_rows(&tx, &self.name, row_position, 1)?;
            Self::upsert_row(&tx, &self.name, row_position, &Vec::new())?;
        }
        tx.commit()?;
        Ok(())
    }

    fn clear_below_header(&mut self) -> SyncResult<()> {
        self.conn.execute(
            "DELETE FROM sheet_rows WHERE sheet = ?1 AND position > 1",
            [&self.name],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceRecord, SyncWindow, header_row};
    use crate::sync::reconcile;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    fn first_cells(sheet: &SqliteSheet<'_>) -> Vec<String> {
        sheet
            .read_all()
            .unwrap()
            .iter()
            .map(|r| r.first().map(Cell::display).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_open_creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("calsheet.db");

        let storage = SqliteStorage::open(&db_path).unwrap();
        storage.sheet("s").append_row(&row(&["a"])).unwrap();
        drop(storage);

        let reopened = SqliteStorage::open(&db_path).unwrap();
        assert_eq!(reopened.sheet("s").read_all().unwrap(), vec![row(&["a"])]);
    }

    #[test]
    fn test_properties_round_trip() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut props = storage.properties();

        assert_eq!(props.get_property("k").unwrap(), None);
        props.set_property("k", "1").unwrap();
        props.set_property("k", "2").unwrap();
        assert_eq!(props.get_property("k").unwrap().as_deref(), Some("2"));

        props.delete_property("k").unwrap();
        props.delete_property("k").unwrap();
        assert_eq!(props.get_property("k").unwrap(), None);
    }

    #[test]
    fn test_properties_with_prefix() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut props = storage.properties();
        props.set_property("calsheet.checkpoint.b", "2").unwrap();
        props.set_property("calsheet.checkpoint.a", "1").unwrap();
        props.set_property("other", "x").unwrap();

        let found = storage.properties_with_prefix("calsheet.checkpoint").unwrap();
        assert_eq!(
            found,
            vec![
                ("calsheet.checkpoint.a".to_string(), "1".to_string()),
                ("calsheet.checkpoint.b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_sheets_are_isolated() {
        let storage = SqliteStorage::open_memory().unwrap();
        storage.sheet("a").append_row(&row(&["1"])).unwrap();
        storage.sheet("b").append_row(&row(&["2"])).unwrap();
        storage.sheet("b").append_row(&row(&["3"])).unwrap();

        assert_eq!(first_cells(&storage.sheet("a")), vec!["1"]);
        assert_eq!(first_cells(&storage.sheet("b")), vec!["2", "3"]);

        let sheets = storage.list_sheets().unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[1].rows, 2);
    }

    #[test]
    fn test_delete_shifts_later_rows_up() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut sheet = storage.sheet("s");
        for id in ["1", "2", "3", "4"] {
            sheet.append_row(&row(&[id])).unwrap();
        }

        sheet.delete_row(2).unwrap();
        assert_eq!(first_cells(&sheet), vec!["1", "3", "4"]);

        sheet.delete_row(3).unwrap();
        assert_eq!(first_cells(&sheet), vec!["1", "3"]);
        assert_eq!(sheet.row_count().unwrap(), 2);

        assert!(matches!(sheet.delete_row(5), Err(SyncError::Store(_))));
    }

    #[test]
    fn test_insert_shifts_rows_down() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut sheet = storage.sheet("s");
        sheet.append_row(&row(&["1"])).unwrap();
        sheet.append_row(&row(&["2"])).unwrap();

        sheet.insert_row_before(1).unwrap();
        assert_eq!(first_cells(&sheet), vec!["", "1", "2"]);

        sheet.insert_row_before(5).unwrap();
        assert_eq!(sheet.row_count().unwrap(), 5);
    }

    #[test]
    fn test_write_range_keeps_other_cells() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut sheet = storage.sheet("s");
        sheet.append_row(&row(&["a", "b", "c", "d"])).unwrap();

        sheet.write_range(1, 2, 2, &row(&["B", "C"])).unwrap();
        sheet.write_range(3, 1, 1, &row(&["z"])).unwrap();

        let rows = sheet.read_all().unwrap();
        assert_eq!(rows[0], row(&["a", "B", "C", "d"]));
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], row(&["z"]));
    }

    #[test]
    fn test_clear_below_header() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut sheet = storage.sheet("s");
        sheet.append_row(&header_row()).unwrap();
        sheet.append_row(&row(&["e1"])).unwrap();
        sheet.append_row(&row(&["e2"])).unwrap();

        sheet.clear_below_header().unwrap();

        assert_eq!(sheet.read_all().unwrap(), vec![header_row()]);
    }

    #[test]
    fn test_reconcile_against_sqlite_sheet() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut sheet = storage.sheet("Team");
        sheet.append_row(&row(&["legacy", "kept"])).unwrap();

        let t = |h| Utc.with_ymd_and_hms(2026, 2, 3, h, 0, 0).unwrap();
        let records = vec![SourceRecord::new("e1", "=SUM(A1)", t(9), t(10))];
        let window = SyncWindow::new(t(0), t(23));

        let first = reconcile(&records, &mut sheet, &window).unwrap();
        let second = reconcile(&records, &mut sheet, &window).unwrap();

        assert_eq!(first.inserted, 1);
        assert!(second.is_noop());
        let rows = sheet.read_all().unwrap();
        assert_eq!(rows[0], header_row());
        assert_eq!(rows[1], row(&["legacy", "kept"]));
        assert_eq!(rows[2][1], Cell::text("'=SUM(A1)"));
    }
}

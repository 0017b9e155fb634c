//! Interfaces to the collaborators the sync engine drives.
//!
//! The engine only talks to these traits. Concrete implementations live in
//! [`crate::storage`] (SQLite and in-memory) and [`crate::source`] (JSONL).

use chrono::{DateTime, Utc};

use crate::model::{Row, SourceRecord, SyncConfig};
use crate::sync::types::SyncResult;

/// Supplies source records for a time range.
pub trait SourceProvider {
    /// Records whose time range intersects `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn records(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<Vec<SourceRecord>>;
}

/// A sheet-like store addressed by 1-based row and column positions.
pub trait TabularStore {
    /// Every row, header included.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn read_all(&self) -> SyncResult<Vec<Row>>;

    /// Append a row after the last row.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append_row(&mut self, row: &Row) -> SyncResult<()>;

    /// Overwrite `num_cols` cells of `row_position` starting at `col_start`.
    ///
    /// Cells outside the range are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write_range(
        &mut self,
        row_position: usize,
        col_start: usize,
        num_cols: usize,
        values: &Row,
    ) -> SyncResult<()>;

    /// Remove a row, shifting later rows up by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the delete fails.
    fn delete_row(&mut self, row_position: usize) -> SyncResult<()>;

    /// Insert a blank row before `row_position`, shifting it and later rows down.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_row_before(&mut self, row_position: usize) -> SyncResult<()>;

    /// Remove every row below the header.
    ///
    /// # Errors
    ///
    /// Returns an error if any delete fails.
    fn clear_below_header(&mut self) -> SyncResult<()> {
        let count = self.read_all()?.len();
        for position in (2..=count).rev() {
            self.delete_row(position)?;
        }
        Ok(())
    }
}

/// String key/value persistence for checkpoints.
pub trait PropertyStore {
    /// Read a property.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn get_property(&self, key: &str) -> SyncResult<Option<String>>;

    /// Write a property.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn set_property(&mut self, key: &str, value: &str) -> SyncResult<()>;

    /// Remove a property. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn delete_property(&mut self, key: &str) -> SyncResult<()>;
}

impl<T: SourceProvider + ?Sized> SourceProvider for &T {
    fn records(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<Vec<SourceRecord>> {
        (**self).records(start, end)
    }
}

impl<T: TabularStore + ?Sized> TabularStore for &mut T {
    fn read_all(&self) -> SyncResult<Vec<Row>> {
        (**self).read_all()
    }

    fn append_row(&mut self, row: &Row) -> SyncResult<()> {
        (**self).append_row(row)
    }

    fn write_range(
        &mut self,
        row_position: usize,
        col_start: usize,
        num_cols: usize,
        values: &Row,
    ) -> SyncResult<()> {
        (**self).write_range(row_position, col_start, num_cols, values)
    }

    fn delete_row(&mut self, row_position: usize) -> SyncResult<()> {
        (**self).delete_row(row_position)
    }

    fn insert_row_before(&mut self, row_position: usize) -> SyncResult<()> {
        (**self).insert_row_before(row_position)
    }

    fn clear_below_header(&mut self) -> SyncResult<()> {
        (**self).clear_below_header()
    }
}

/// The collaborators resolved for one config.
pub enum Connected<'a> {
    /// Both sides are available.
    Ready {
        source: Box<dyn SourceProvider + 'a>,
        store: Box<dyn TabularStore + 'a>,
    },
    /// The config cannot be synced right now; not an error.
    Missing { reason: String },
}

/// Resolves a [`SyncConfig`] to its source and store.
pub trait Connector {
    /// Connect both sides of a config.
    ///
    /// # Errors
    ///
    /// Returns an error if a backend fails while opening.
    fn connect(&mut self, config: &SyncConfig) -> SyncResult<Connected<'_>>;
}

//! Lookup from record id to the sheet row that holds it.

use std::collections::HashMap;

use crate::model::Row;

/// Where a record currently lives in the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRow {
    /// 1-based sheet position (header is row 1)
    pub row_position: usize,
    /// Stored values, foreign columns included
    pub values: Row,
}

/// Index over the data rows of a sheet.
#[derive(Debug, Default)]
pub struct RowIndex {
    entries: HashMap<String, IndexedRow>,
}

impl RowIndex {
    /// Build the index from data rows (header already removed).
    ///
    /// Empty rows and rows whose id cell is blank are skipped. If an id
    /// appears twice, the lower row wins; the later copy is left alone.
    #[must_use]
    pub fn build(data_rows: &[Row]) -> Self {
        let mut entries = HashMap::with_capacity(data_rows.len());

        for (offset, row) in data_rows.iter().enumerate() {
            let Some(id_cell) = row.first() else {
                continue;
            };
            if id_cell.is_blank() {
                continue;
            }

            entries
                .entry(id_cell.display())
                .or_insert_with(|| IndexedRow {
                    row_position: offset + 2,
                    values: row.clone(),
                });
        }

        Self { entries }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IndexedRow> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending row order.
    #[must_use]
    pub fn iter_by_position(&self) -> Vec<(&str, &IndexedRow)> {
        let mut items: Vec<_> = self
            .entries
            .iter()
            .map(|(id, entry)| (id.as_str(), entry))
            .collect();
        items.sort_by_key(|(_, entry)| entry.row_position);
        items
    }
}

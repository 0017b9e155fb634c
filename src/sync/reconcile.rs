//! Reconciliation of desired records against sheet rows.
//!
//! # Two phases
//!
//! 1. **Plan**: [`plan_reconcile`] diffs the projected records against a
//!    [`RowIndex`] and produces an immutable [`ReconcilePlan`]. Nothing is
//!    written while the diff is being computed.
//! 2. **Apply**: [`apply_plan`] issues updates, then appends, then deletes in
//!    strictly descending row order so pending positions never shift.
//!
//! # Deletion policy
//!
//! A row whose record is absent upstream is deleted only if its own start and
//! end cells parse as instants and its start falls inside the window being
//! reconciled. History outside the window and malformed rows are kept.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::model::{Cell, Row, SourceRecord, SyncWindow, col};
use crate::sync::compare::rows_equal;
use crate::sync::header::ensure_header;
use crate::sync::project::project;
use crate::sync::row_index::{IndexedRow, RowIndex};
use crate::sync::store::TabularStore;
use crate::sync::types::{ReconcileStats, SyncResult};

/// Every mutation one pass will perform.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcilePlan {
    /// In-place rewrites: (row position, schema cells)
    pub updates: Vec<(usize, Row)>,
    /// New rows, in first-seen record order
    pub appends: Vec<Row>,
    /// Row positions to delete, highest first
    pub deletes: Vec<usize>,
    /// Rows that matched their record
    pub unchanged: usize,
    /// Rows with no record that were kept
    pub protected: usize,
}

impl ReconcilePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.appends.is_empty() && self.deletes.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> ReconcileStats {
        ReconcileStats {
            inserted: self.appends.len(),
            updated: self.updates.len(),
            unchanged: self.unchanged,
            deleted: self.deletes.len(),
            protected: self.protected,
        }
    }
}

/// Project records into (id, row) pairs keyed by id.
///
/// A later record with the same id replaces the earlier one but keeps the
/// earlier one's place in the order.
fn desired_rows(records: &[SourceRecord]) -> (Vec<(String, Row)>, HashMap<String, usize>) {
    let mut ordered: Vec<(String, Row)> = Vec::with_capacity(records.len());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(records.len());

    for record in records {
        let row = project(record);
        match slots.get(&record.id) {
            Some(&slot) => ordered[slot].1 = row,
            None => {
                slots.insert(record.id.clone(), ordered.len());
                ordered.push((record.id.clone(), row));
            }
        }
    }

    (ordered, slots)
}

/// Whether a row without an upstream record may be deleted in this window.
#[must_use]
pub fn is_deletable(entry: &IndexedRow, window: &SyncWindow) -> bool {
    let start = entry.values.get(col::START).and_then(Cell::as_instant);
    let end = entry.values.get(col::END).and_then(Cell::as_instant);

    match (start, end) {
        (Some(start), Some(_)) => window.contains(start),
        _ => false,
    }
}

/// Compute the plan for one window without touching the store.
#[must_use]
pub fn plan_reconcile(
    records: &[SourceRecord],
    index: &RowIndex,
    window: &SyncWindow,
) -> ReconcilePlan {
    let (desired, slots) = desired_rows(records);
    let mut plan = ReconcilePlan::default();

    for (id, row) in desired {
        match index.get(&id) {
            Some(existing) if rows_equal(&row, &existing.values) => plan.unchanged += 1,
            Some(existing) => plan.updates.push((existing.row_position, row)),
            None => plan.appends.push(row),
        }
    }

    for (id, entry) in index.iter_by_position() {
        if slots.contains_key(id) {
            continue;
        }
        if is_deletable(entry, window) {
            plan.deletes.push(entry.row_position);
        } else {
            debug!(id, row = entry.row_position, "Keeping row outside window");
            plan.protected += 1;
        }
    }

    plan.deletes.sort_unstable_by(|a, b| b.cmp(a));
    plan
}

/// Apply a plan to the store.
///
/// # Errors
///
/// Returns the first store error; later operations are not attempted.
pub fn apply_plan(store: &mut dyn TabularStore, plan: &ReconcilePlan) -> SyncResult<()> {
    for (position, row) in &plan.updates {
        store.write_range(*position, 1, row.len(), row)?;
    }

    for row in &plan.appends {
        store.append_row(row)?;
    }

    for position in &plan.deletes {
        store.delete_row(*position)?;
    }

    Ok(())
}

/// Reconcile one window: ensure the header, diff, and apply.
///
/// # Errors
///
/// Store errors propagate unchanged.
pub fn reconcile(
    records: &[SourceRecord],
    store: &mut dyn TabularStore,
    window: &SyncWindow,
) -> SyncResult<ReconcileStats> {
    ensure_header(store)?;

    let rows = store.read_all()?;
    let index = RowIndex::build(rows.get(1..).unwrap_or_default());

    let plan = plan_reconcile(records, &index, window);
    let stats = plan.stats();

    if plan.is_empty() {
        debug!(unchanged = stats.unchanged, "Nothing to write");
        return Ok(stats);
    }

    apply_plan(store, &plan)?;

    info!(
        inserted = stats.inserted,
        updated = stats.updated,
        deleted = stats.deleted,
        unchanged = stats.unchanged,
        protected = stats.protected,
        "Reconciled window"
    );
    Ok(stats)
}

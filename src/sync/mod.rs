//! Windowed calendar-to-sheet reconciliation.
//!
//! The engine turns source records into sheet rows and keeps a sheet in
//! step with its source one time window at a time:
//!
//! - **Project**: record → 7-column row, user text sanitized against formula injection
//! - **Index**: existing rows keyed by id, with their 1-based positions
//! - **Reconcile**: inserts, in-place updates for changed rows, and deletes
//!   limited to rows whose own start lies inside the window
//! - **Drive**: split the range since the checkpoint into windows, reconcile
//!   each, and persist the checkpoint after every window
//!
//! Human-added columns to the right of the schema, rows outside the window
//! and rows without parsable timestamps are never touched.
//!
//! # Example
//!
//! ```ignore
//! use calsheet::storage::SqliteStorage;
//! use calsheet::source::LocalConnector;
//! use calsheet::sync::WindowedSyncDriver;
//!
//! let storage = SqliteStorage::open(&db_path)?;
//! let mut props = storage.properties();
//! let mut connector = LocalConnector::new(settings.source_dir(&config_path), &storage);
//! let mut driver = WindowedSyncDriver::new(&mut props, settings.options.clone());
//! let batch = driver.sync_all(&mut connector, &settings.syncs, None, None);
//! ```

mod checkpoint;
mod compare;
mod driver;
mod header;
mod project;
mod reconcile;
mod row_index;
mod sanitize;
mod store;
mod types;

pub use checkpoint::{CHECKPOINT_KEY, CheckpointStore, checkpoint_key};
pub use compare::{cells_equal, rows_equal};
pub use driver::{Clock, ConfigSelector, WindowedSyncDriver, parse_instant, select_configs};
pub use header::{HeaderAction, ensure_header, is_header};
pub use project::project;
pub use reconcile::{ReconcilePlan, apply_plan, is_deletable, plan_reconcile, reconcile};
pub use row_index::{IndexedRow, RowIndex};
pub use sanitize::{ESCAPE_PREFIX, sanitize, sanitize_str};
pub use store::{Connected, Connector, PropertyStore, SourceProvider, TabularStore};
pub use types::{
    BatchReport, ReconcileStats, SyncError, SyncFailure, SyncOutcome, SyncReport, SyncResult,
};

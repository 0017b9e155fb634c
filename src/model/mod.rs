//! Data models for calsheet.
//!
//! This module contains the domain models:
//! - SourceRecord / Participant (what the source reports)
//! - Cell / Row (what the sheet stores)
//! - SyncConfig / SyncOptions / SyncWindow (how a sync is scoped)

pub mod config;
pub mod record;
pub mod row;

pub use config::{SyncConfig, SyncOptions, SyncWindow};
pub use record::{Participant, SourceRecord};
pub use row::{Cell, HEADER, Row, SCHEMA_COLUMNS, col, header_row, to_iso};

//! Storage backends for the sync engine.
//!
//! - [`sqlite`] - persistent sheets, checkpoints and history (WAL mode)
//! - [`memory`] - in-memory stores, used to drive the engine without a database
//! - [`events`] - sync history records
//! - [`schema`] - database schema definitions

pub mod events;
pub mod memory;
pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use events::{Event, EventType};
pub use memory::{MemoryConnector, MemoryProperties, MemorySheet, MemorySource};
pub use sqlite::{SheetSummary, SqliteProperties, SqliteSheet, SqliteStorage};

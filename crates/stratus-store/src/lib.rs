//! Durable record storage for Stratus
//!
//! Defines the `RecordStore` trait the orchestrator persists through,
//! and its SQLite implementation. Every mutation runs inside a scoped
//! transaction: either the whole write lands or nothing changes.

pub mod record;
pub mod sqlite;
pub mod store;

pub use record::{ListFilter, NewRecord, WeatherRecord, DEFAULT_LIMIT, MAX_LIMIT};
pub use sqlite::SqliteRecordStore;
pub use store::{RecordStore, StoreError, StoreResult};

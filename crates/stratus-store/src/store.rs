//! Storage gateway trait and error types.
//!
//! Abstracts over the durable record store so the orchestrator can be
//! exercised against any implementation.

use crate::record::{ListFilter, NewRecord, WeatherRecord};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with the given id.
    #[error("record not found: {0}")]
    NotFound(i64),

    /// Database failure; the enclosing transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable store for weather records.
///
/// Mutating operations take `&mut self`; callers that share a store
/// across threads wrap it in a mutex (the service layer does).
pub trait RecordStore: Send {
    /// Persist a new record, assigning id and timestamps.
    fn create(&mut self, record: NewRecord) -> StoreResult<WeatherRecord>;

    /// Fetch a record by id; `None` when absent.
    fn get(&self, id: i64) -> StoreResult<Option<WeatherRecord>>;

    /// List records matching the filter, ordered by id ascending.
    /// An offset past the end yields an empty list, not an error.
    fn list(&self, filter: &ListFilter) -> StoreResult<Vec<WeatherRecord>>;

    /// Every record, unpaged, ordered by id ascending (export path).
    fn list_all(&self) -> StoreResult<Vec<WeatherRecord>>;

    /// Replace all caller-supplied fields of an existing record in one
    /// transaction. `created_at` is preserved, `updated_at` refreshed.
    ///
    /// # Errors
    /// `StoreError::NotFound` when the id does not exist.
    fn update(&mut self, id: i64, fields: NewRecord) -> StoreResult<WeatherRecord>;

    /// Delete a record by id.
    ///
    /// # Errors
    /// `StoreError::NotFound` when the id does not exist — including a
    /// repeat delete of an already-deleted id.
    fn delete(&mut self, id: i64) -> StoreResult<()>;

    /// Delete every record, returning how many were removed.
    fn clear_all(&mut self) -> StoreResult<usize>;

    /// Number of stored records.
    fn count(&self) -> StoreResult<usize>;
}

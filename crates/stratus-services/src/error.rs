//! Service-level error type.
//!
//! The union of everything the pipeline, store, exporters and
//! enrichment gateways can fail with. Each variant carries a stable
//! machine kind (used by the HTTP layer) and a human-readable reason.

use chrono::NaiveDate;
use stratus_store::StoreError;
use stratus_weather::{DateRangeError, WeatherError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or empty field, rejected locally.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Geocoding found no match for a syntactically valid query.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Invalid date range: {0}")]
    DateRange(DateRangeError),

    /// Network or provider failure; transient, not retried here.
    #[error("Upstream provider unavailable: {0}")]
    Upstream(String),

    /// Provider reachable but missing readings for part of the range.
    #[error("no weather data for {} requested day(s)", missing.len())]
    NoDataForRange { missing: Vec<NaiveDate> },

    /// Operation targeted a record id that does not exist.
    #[error("Weather record not found: {0}")]
    NotFound(i64),

    /// Storage transaction failed and was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Export error: {0}")]
    Export(String),

    /// An enrichment gateway was called without its API key configured.
    #[error("No API key configured for {0}")]
    MissingApiKey(&'static str),
}

impl ServiceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }

    /// Stable machine-readable kind for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::LocationNotFound(_) => "location_not_found",
            Self::DateRange(_) => "date_range_invalid",
            Self::Upstream(_) => "upstream_unavailable",
            Self::NoDataForRange { .. } => "no_data_for_range",
            Self::NotFound(_) => "not_found",
            Self::Persistence(_) => "persistence_error",
            Self::Export(_) => "export_error",
            Self::MissingApiKey(_) => "missing_api_key",
        }
    }
}

impl From<WeatherError> for ServiceError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::InvalidInput(msg) => Self::InvalidInput(msg),
            WeatherError::LocationNotFound(query) => Self::LocationNotFound(query),
            WeatherError::DateRange(e) => Self::DateRange(e),
            WeatherError::Upstream(msg) => Self::Upstream(msg),
            WeatherError::NoDataForRange { missing } => Self::NoDataForRange { missing },
        }
    }
}

impl From<DateRangeError> for ServiceError {
    fn from(err: DateRangeError) -> Self {
        Self::DateRange(err)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Storage(msg) => Self::Persistence(msg),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

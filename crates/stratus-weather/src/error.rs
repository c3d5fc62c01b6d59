//! Pipeline error types.
//!
//! Every failure carries a machine-distinguishable variant and a
//! human-readable reason; callers match on the variant, never on the
//! message text.

use chrono::NaiveDate;
use thiserror::Error;

/// Reasons a date range fails validation.
///
/// Rules are checked in a fixed order and the first violated rule is the
/// one reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("date '{0}' is not in YYYY-MM-DD format")]
    MalformedDate(String),

    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("start date {start} is more than 365 days in the past")]
    StartTooFarInPast { start: NaiveDate },

    #[error("end date {end} is more than 7 days in the future")]
    EndTooFarInFuture { end: NaiveDate },
}

/// Errors produced by the geocoding resolver and weather fetcher.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Input rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Syntactically valid query with no geocoding match.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Invalid date range: {0}")]
    DateRange(#[from] DateRangeError),

    /// Transport failure or provider-side error; transient.
    #[error("Upstream provider unavailable: {0}")]
    Upstream(String),

    /// Provider reachable but had no readings for part of the range.
    #[error("no weather data for {} requested day(s)", missing.len())]
    NoDataForRange { missing: Vec<NaiveDate> },
}

impl WeatherError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn location_not_found(query: impl Into<String>) -> Self {
        Self::LocationNotFound(query.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Classify a transport-level failure, keeping the timeout/connect
    /// distinction visible in the message.
    pub fn upstream_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Upstream(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::Upstream(format!("connection failed: {err}"))
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

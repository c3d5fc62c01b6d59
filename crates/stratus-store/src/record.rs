use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stratus_weather::TemperatureData;

/// Default page size when a list call does not specify one.
pub const DEFAULT_LIMIT: u32 = 100;

/// Hard ceiling on a single list page.
pub const MAX_LIMIT: u32 = 500;

/// One persisted weather lookup.
///
/// `location`, `latitude` and `longitude` always come from the geocoding
/// resolver; raw user input is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub id: i64,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub temperature_data: TemperatureData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set for a create or full replace; ids and timestamps are
/// store-assigned.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub temperature_data: TemperatureData,
}

/// Filter for list queries. All fields optional; results are always
/// ordered by id ascending.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    /// Case-insensitive substring match on the canonical location.
    pub location: Option<String>,
    /// Keep records whose start_date is on or after this date.
    pub start_date: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListFilter {
    /// Requested page size, defaulted and capped.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

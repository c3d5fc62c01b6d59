//! Weather lookup core for Stratus
//!
//! Provides the validation and enrichment pipeline stages: forward
//! geocoding of free-text locations, date-range validation, and
//! date-keyed temperature retrieval from the upstream provider.

pub mod condition;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod types;
pub mod validate;

pub use condition::WeatherCondition;
pub use error::{DateRangeError, WeatherError};
pub use forecast::WeatherClient;
pub use geocode::GeocodingClient;
pub use types::{DaySeries, ResolvedLocation, Segment, TemperatureBucket, TemperatureData};
pub use validate::DateRange;

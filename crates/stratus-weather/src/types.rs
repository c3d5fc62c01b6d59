use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A location resolved to canonical form by the geocoder.
///
/// `name` is the provider's display name, never the raw user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Which upstream endpoint a day's readings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Archive,
    Forecast,
}

/// One time-of-day reading. The provider fields are kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureBucket {
    pub time: NaiveTime,
    pub reading: serde_json::Value,
}

/// All buckets for a single day, tagged with their source segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySeries {
    pub segment: Segment,
    pub buckets: Vec<TemperatureBucket>,
}

/// Date-keyed temperature payload covering a full requested range.
///
/// Days below the historical/forecast boundary come from the archive
/// endpoint, the rest from the forecast endpoint; the two segments never
/// overlap and leave no gap at the boundary date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemperatureData {
    pub days: BTreeMap<NaiveDate, DaySeries>,
}

impl TemperatureData {
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total number of readings across all days.
    pub fn bucket_count(&self) -> usize {
        self.days.values().map(|d| d.buckets.len()).sum()
    }

    /// The first reading of the earliest day, if any.
    pub fn first_reading(&self) -> Option<&serde_json::Value> {
        self.days
            .values()
            .next()
            .and_then(|day| day.buckets.first())
            .map(|bucket| &bucket.reading)
    }
}

//! Weather retrieval for a coordinate and date range.
//!
//! The upstream provider splits history and forecast across two
//! endpoints; this module stitches both into one date-keyed payload.
//! Days before the injected `today` come from the archive endpoint,
//! `today` and later from the forecast endpoint, so the segments never
//! overlap and meet without a gap at the boundary.

use crate::error::WeatherError;
use crate::types::{DaySeries, Segment, TemperatureBucket, TemperatureData};
use crate::validate::DateRange;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::instrument;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Hourly series requested from the provider. Whatever fields come back
/// are stored verbatim in the record payload.
const HOURLY_FIELDS: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,weather_code";

/// Intraday granularity: readings are kept every this many hours.
pub const BUCKET_HOURS: u32 = 3;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    time: Vec<String>,
    #[serde(flatten)]
    series: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Client for the upstream weather provider.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    forecast_url: String,
    archive_url: String,
}

impl WeatherClient {
    /// Client against the default public endpoints.
    ///
    /// # Errors
    /// Returns `WeatherError::Upstream` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_urls(FORECAST_URL, ARCHIVE_URL)
    }

    /// Client against custom endpoints (config override, tests).
    ///
    /// # Errors
    /// Returns `WeatherError::Upstream` if the HTTP client cannot be built.
    pub fn with_base_urls(forecast_url: &str, archive_url: &str) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| WeatherError::upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            forecast_url: forecast_url.to_string(),
            archive_url: archive_url.to_string(),
        })
    }

    /// Fetch temperature data for the full range, keyed by date and
    /// 3-hour bucket.
    ///
    /// Days the provider has no readings for are never fabricated; they
    /// are reported through `NoDataForRange` with the exact missing
    /// dates, distinguishable from a wholesale outage (`Upstream`).
    ///
    /// # Errors
    /// `Upstream` on transport/provider failure, `NoDataForRange` when
    /// any requested day comes back empty.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        range: DateRange,
        today: NaiveDate,
    ) -> Result<TemperatureData, WeatherError> {
        let mut data = TemperatureData::default();

        if range.start < today {
            let archive_end = range.end.min(today - Duration::days(1));
            let days = self
                .fetch_segment(
                    &self.archive_url,
                    latitude,
                    longitude,
                    range.start,
                    archive_end,
                    Segment::Archive,
                )
                .await?;
            data.days.extend(days);
        }

        if range.end >= today {
            let forecast_start = range.start.max(today);
            let days = self
                .fetch_segment(
                    &self.forecast_url,
                    latitude,
                    longitude,
                    forecast_start,
                    range.end,
                    Segment::Forecast,
                )
                .await?;
            data.days.extend(days);
        }

        let missing: Vec<NaiveDate> =
            range.days().filter(|day| !data.days.contains_key(day)).collect();
        if !missing.is_empty() {
            tracing::warn!(?missing, "provider returned no readings for part of the range");
            return Err(WeatherError::NoDataForRange { missing });
        }

        tracing::info!(days = data.day_count(), buckets = data.bucket_count(), "fetched range");
        Ok(data)
    }

    async fn fetch_segment(
        &self,
        base_url: &str,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        segment: Segment,
    ) -> Result<BTreeMap<NaiveDate, DaySeries>, WeatherError> {
        let response = self
            .http
            .get(base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .await
            .map_err(WeatherError::upstream_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::upstream(format!(
                "weather endpoint returned status {status}"
            )));
        }

        let parsed: HourlyResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::upstream(format!("invalid weather response: {e}")))?;

        bucketize(&parsed.hourly, segment)
    }
}

/// Group raw hourly series into per-day 3-hour buckets, keeping each
/// reading's provider fields verbatim.
fn bucketize(
    hourly: &HourlySeries,
    segment: Segment,
) -> Result<BTreeMap<NaiveDate, DaySeries>, WeatherError> {
    let mut days: BTreeMap<NaiveDate, DaySeries> = BTreeMap::new();

    for (idx, stamp) in hourly.time.iter().enumerate() {
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).map_err(|_| {
            WeatherError::upstream(format!("unparseable timestamp '{stamp}' in response"))
        })?;
        if timestamp.hour() % BUCKET_HOURS != 0 {
            continue;
        }

        let mut reading = serde_json::Map::new();
        for (field, values) in &hourly.series {
            if let Some(value) = values.get(idx) {
                if !value.is_null() {
                    reading.insert(field.clone(), value.clone());
                }
            }
        }
        // An all-null row means the provider had nothing for this stamp.
        if reading.is_empty() {
            continue;
        }

        days.entry(timestamp.date())
            .or_insert_with(|| DaySeries { segment, buckets: Vec::new() })
            .buckets
            .push(TemperatureBucket {
                time: timestamp.time(),
                reading: serde_json::Value::Object(reading),
            });
    }

    Ok(days)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    fn series(times: &[&str], temps: &[serde_json::Value]) -> HourlySeries {
        let mut fields = BTreeMap::new();
        fields.insert("temperature_2m".to_string(), temps.to_vec());
        HourlySeries { time: times.iter().map(|s| s.to_string()).collect(), series: fields }
    }

    #[test]
    fn bucketize_keeps_only_three_hourly_readings() {
        let hourly = series(
            &["2024-01-01T00:00", "2024-01-01T01:00", "2024-01-01T03:00"],
            &[json!(1.0), json!(2.0), json!(3.0)],
        );
        let days = bucketize(&hourly, Segment::Forecast).unwrap();

        let day = &days[&NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()];
        assert_eq!(day.buckets.len(), 2);
        assert_eq!(day.buckets[0].reading["temperature_2m"], json!(1.0));
        assert_eq!(day.buckets[1].reading["temperature_2m"], json!(3.0));
    }

    #[test]
    fn bucketize_groups_by_day() {
        let hourly = series(
            &["2024-01-01T21:00", "2024-01-02T00:00"],
            &[json!(5.0), json!(6.0)],
        );
        let days = bucketize(&hourly, Segment::Archive).unwrap();
        assert_eq!(days.len(), 2);
        assert!(days.values().all(|d| d.segment == Segment::Archive));
    }

    #[test]
    fn bucketize_drops_all_null_rows() {
        let hourly = series(
            &["2024-01-01T00:00", "2024-01-01T03:00"],
            &[json!(null), json!(2.5)],
        );
        let days = bucketize(&hourly, Segment::Forecast).unwrap();
        let day = &days[&NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()];
        assert_eq!(day.buckets.len(), 1);
        assert_eq!(day.buckets[0].time, chrono::NaiveTime::from_hms_opt(3, 0, 0).unwrap());
    }

    #[test]
    fn bucketize_rejects_garbage_timestamps() {
        let hourly = series(&["yesterday-ish"], &[json!(1.0)]);
        let err = bucketize(&hourly, Segment::Forecast).unwrap_err();
        assert!(matches!(err, WeatherError::Upstream(_)));
    }
}

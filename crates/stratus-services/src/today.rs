//! Current-day outlook: resolve a location and summarize today's
//! 3-hour readings without persisting anything.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

use crate::error::{ServiceError, ServiceResult};
use crate::record::RecordService;
use stratus_store::RecordStore;
use stratus_weather::{DateRange, TemperatureBucket, WeatherCondition};

/// Today's weather for a resolved location, bucketed every 3 hours.
#[derive(Debug, Clone, Serialize)]
pub struct TodayOutlook {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: NaiveDate,
    pub buckets: Vec<TemperatureBucket>,
    /// Most frequent condition across the day's buckets; frequency ties
    /// go to the more disruptive condition.
    pub dominant_condition: String,
    pub total_periods: usize,
}

impl<S: RecordStore> RecordService<S> {
    /// Resolve `raw_location` and fetch today's 3-hour readings.
    ///
    /// # Errors
    /// Same taxonomy as `create`, minus persistence: `InvalidInput`,
    /// `LocationNotFound`, `Upstream`, `NoDataForRange`.
    #[instrument(skip(self), level = "info")]
    pub async fn today_outlook(
        &self,
        raw_location: &str,
        today: NaiveDate,
    ) -> ServiceResult<TodayOutlook> {
        let resolved = self.geocoder().resolve(raw_location).await?;
        self.outlook_at(resolved.name, resolved.latitude, resolved.longitude, today).await
    }

    /// Same outlook for raw coordinates, skipping forward geocoding.
    /// The display name comes from reverse geocoding, falling back to
    /// the coordinates themselves when the resolver has no answer.
    ///
    /// # Errors
    /// `Upstream` or `NoDataForRange` from the weather fetch.
    #[instrument(skip(self), level = "info")]
    pub async fn today_outlook_at(
        &self,
        latitude: f64,
        longitude: f64,
        today: NaiveDate,
    ) -> ServiceResult<TodayOutlook> {
        let name = self
            .geocoder()
            .reverse(latitude, longitude)
            .await
            .unwrap_or_else(|| format!("{latitude},{longitude}"));
        self.outlook_at(name, latitude, longitude, today).await
    }

    async fn outlook_at(
        &self,
        location: String,
        latitude: f64,
        longitude: f64,
        today: NaiveDate,
    ) -> ServiceResult<TodayOutlook> {
        let range = DateRange::single(today);
        let data = self.weather().fetch(latitude, longitude, range, today).await?;

        // fetch() already guarantees the requested day is present.
        let day = data.days.get(&today).ok_or(ServiceError::NoDataForRange {
            missing: vec![today],
        })?;

        Ok(TodayOutlook {
            location,
            latitude,
            longitude,
            date: today,
            dominant_condition: dominant_condition(&day.buckets),
            total_periods: day.buckets.len(),
            buckets: day.buckets.clone(),
        })
    }
}

/// Most frequent `WeatherCondition` across the buckets, by WMO code.
/// Ties are broken toward the more severe condition; buckets without a
/// weather code are ignored.
fn dominant_condition(buckets: &[TemperatureBucket]) -> String {
    let mut counts: BTreeMap<WeatherCondition, usize> = BTreeMap::new();
    for bucket in buckets {
        let Some(code) = bucket.reading.get("weather_code").and_then(serde_json::Value::as_i64)
        else {
            continue;
        };
        *counts.entry(WeatherCondition::from_wmo_code(code as i32)).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by_key(|&(condition, count)| (count, condition.severity()))
        .map(|(condition, _)| condition.description().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

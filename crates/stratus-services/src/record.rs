//! Record service: the create/update orchestrator.
//!
//! Composes the geocoding resolver, date-range validator and weather
//! fetcher into the persistence pipeline. Collaborators are injected at
//! construction; there is no global service state.

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::instrument;

use crate::error::{ServiceError, ServiceResult};
use stratus_store::{ListFilter, NewRecord, RecordStore, WeatherRecord};
use stratus_weather::{
    DateRange, GeocodingClient, ResolvedLocation, TemperatureData, WeatherClient,
};

/// Orchestrator for the weather-record lifecycle.
///
/// Pipeline order is fixed: resolve the location, validate the dates,
/// fetch the weather, persist. The first failure short-circuits; in
/// particular no weather fetch and no storage write happen after a
/// validation failure.
pub struct RecordService<S> {
    geocoder: GeocodingClient,
    weather: WeatherClient,
    store: Mutex<S>,
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(geocoder: GeocodingClient, weather: WeatherClient, store: S) -> Self {
        Self { geocoder, weather, store: Mutex::new(store) }
    }

    /// Run the full pipeline and persist a new record.
    ///
    /// # Errors
    /// Any pipeline failure (`InvalidInput`, `LocationNotFound`,
    /// `DateRange`, `Upstream`, `NoDataForRange`) or `Persistence` when
    /// the transaction fails — in which case nothing is committed.
    #[instrument(skip(self), level = "info")]
    pub async fn create(
        &self,
        raw_location: &str,
        start_date: &str,
        end_date: &str,
        today: NaiveDate,
    ) -> ServiceResult<WeatherRecord> {
        let (resolved, range, data) =
            self.run_pipeline(raw_location, start_date, end_date, today).await?;

        let record = self.store.lock().create(assemble(resolved, range, data))?;
        tracing::info!(id = record.id, "created weather record");
        Ok(record)
    }

    /// Re-run the pipeline for an existing record and replace its
    /// fields atomically. `created_at` is preserved, `updated_at`
    /// refreshed.
    ///
    /// # Errors
    /// `NotFound` when the id does not exist (checked before any
    /// upstream call), otherwise as for `create`.
    #[instrument(skip(self), level = "info")]
    pub async fn update(
        &self,
        id: i64,
        raw_location: &str,
        start_date: &str,
        end_date: &str,
        today: NaiveDate,
    ) -> ServiceResult<WeatherRecord> {
        if self.store.lock().get(id)?.is_none() {
            return Err(ServiceError::NotFound(id));
        }

        let (resolved, range, data) =
            self.run_pipeline(raw_location, start_date, end_date, today).await?;

        let record = self.store.lock().update(id, assemble(resolved, range, data))?;
        tracing::info!(id, "updated weather record");
        Ok(record)
    }

    /// Fetch a record by id.
    ///
    /// # Errors
    /// `NotFound` when absent.
    pub fn get(&self, id: i64) -> ServiceResult<WeatherRecord> {
        self.store.lock().get(id)?.ok_or(ServiceError::NotFound(id))
    }

    /// List records matching the filter, ordered by id ascending.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn list(&self, filter: &ListFilter) -> ServiceResult<Vec<WeatherRecord>> {
        Ok(self.store.lock().list(filter)?)
    }

    /// Every stored record, unpaged (export path).
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn list_all(&self) -> ServiceResult<Vec<WeatherRecord>> {
        Ok(self.store.lock().list_all()?)
    }

    /// Delete a record by id. Repeat deletes of the same id report
    /// `NotFound`, never silent success.
    ///
    /// # Errors
    /// `NotFound` when absent.
    pub fn delete(&self, id: i64) -> ServiceResult<()> {
        self.store.lock().delete(id)?;
        tracing::info!(id, "deleted weather record");
        Ok(())
    }

    /// Delete every record, returning how many were removed.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn clear_all(&self) -> ServiceResult<usize> {
        let count = self.store.lock().clear_all()?;
        tracing::info!(count, "cleared weather records");
        Ok(count)
    }

    /// Number of stored records (health checks, tests).
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn count(&self) -> ServiceResult<usize> {
        Ok(self.store.lock().count()?)
    }

    pub(crate) fn geocoder(&self) -> &GeocodingClient {
        &self.geocoder
    }

    pub(crate) fn weather(&self) -> &WeatherClient {
        &self.weather
    }

    async fn run_pipeline(
        &self,
        raw_location: &str,
        start_date: &str,
        end_date: &str,
        today: NaiveDate,
    ) -> ServiceResult<(ResolvedLocation, DateRange, TemperatureData)> {
        // Coordinates gate the fetch, so resolution goes first; the
        // resolver rejects empty input before touching the network.
        let resolved = self.geocoder.resolve(raw_location).await?;

        // Dates are cheap to check, so they are settled before the
        // network-bound weather fetch.
        let range = DateRange::parse_and_validate(start_date, end_date, today)?;

        let data =
            self.weather.fetch(resolved.latitude, resolved.longitude, range, today).await?;

        Ok((resolved, range, data))
    }
}

fn assemble(resolved: ResolvedLocation, range: DateRange, data: TemperatureData) -> NewRecord {
    NewRecord {
        location: resolved.name,
        latitude: resolved.latitude,
        longitude: resolved.longitude,
        start_date: range.start,
        end_date: range.end,
        temperature_data: data,
    }
}

//! Nearby-places enrichment for a record's coordinates.

use crate::error::{ServiceError, ServiceResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

const PLACES_API_URL: &str = "https://maps.googleapis.com/maps/api/place";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_RADIUS_METERS: u32 = 5_000;
const MAX_RADIUS_METERS: u32 = 50_000;

/// One nearby place, flattened for API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct Place {
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub open_now: Option<bool>,
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyResult>,
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    name: String,
    vicinity: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    open_now: Option<bool>,
}

/// Client for the places provider.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PlacesClient {
    /// Client against the default endpoint. `api_key` may be absent;
    /// lookups then fail with `MissingApiKey`.
    ///
    /// # Errors
    /// Returns `ServiceError::Upstream` if the HTTP client cannot be built.
    pub fn new(api_key: Option<String>) -> ServiceResult<Self> {
        Self::with_base_url(PLACES_API_URL, api_key)
    }

    /// Client against a custom endpoint (tests).
    ///
    /// # Errors
    /// Returns `ServiceError::Upstream` if the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str, api_key: Option<String>) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ServiceError::upstream(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), api_key })
    }

    /// Places of `place_type` within `radius_meters` of the coordinates.
    ///
    /// # Errors
    /// `MissingApiKey` without a configured key, `Upstream` on
    /// transport or provider failure.
    #[instrument(skip(self), level = "info")]
    pub async fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
        place_type: &str,
    ) -> ServiceResult<Vec<Place>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ServiceError::MissingApiKey("nearby places"));
        };

        let radius = radius_meters.clamp(1, MAX_RADIUS_METERS);
        let url = format!("{}/nearbysearch/json", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("location", format!("{latitude},{longitude}")),
                ("radius", radius.to_string()),
                ("type", place_type.to_string()),
                ("key", api_key.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::upstream(format!(
                "places search returned status {status}"
            )));
        }

        let parsed: NearbyResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::upstream(format!("invalid places response: {e}")))?;

        // ZERO_RESULTS is a successful empty answer, not an error.
        if parsed.status != "OK" && parsed.status != "ZERO_RESULTS" {
            return Err(ServiceError::upstream(format!(
                "places search returned status '{}'",
                parsed.status
            )));
        }

        let places: Vec<Place> = parsed
            .results
            .into_iter()
            .map(|result| Place {
                name: result.name,
                address: result.vicinity,
                rating: result.rating,
                user_ratings_total: result.user_ratings_total,
                open_now: result.opening_hours.and_then(|h| h.open_now),
                types: result.types,
            })
            .collect();

        tracing::info!(count = places.len(), "places search completed");
        Ok(places)
    }
}

//! Forward geocoding: resolve free-text locations to coordinates.
//! Uses a Nominatim-compatible search endpoint - free, no API key required.

use crate::error::WeatherError;
use crate::types::ResolvedLocation;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
// Nominatim rejects requests without an identifying agent.
const USER_AGENT: &str = "Stratus/0.1.0 (weather record backend)";
const MAX_CANDIDATES: u32 = 5;

#[derive(Debug, Deserialize)]
struct SearchCandidate {
    display_name: String,
    // Nominatim serializes coordinates as strings.
    lat: String,
    lon: String,
    #[serde(default)]
    importance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    #[serde(rename = "state_district")]
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

/// Client for the geocoding provider.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    http: Client,
    base_url: String,
}

impl GeocodingClient {
    /// Client against the default public endpoint.
    ///
    /// # Errors
    /// Returns `WeatherError::Upstream` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(NOMINATIM_URL)
    }

    /// Client against a custom endpoint (config override, tests).
    ///
    /// # Errors
    /// Returns `WeatherError::Upstream` if the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Resolve free-text input to a canonical name and coordinates.
    ///
    /// Empty or whitespace-only input is rejected before any network
    /// call. A reachable provider with no candidates yields
    /// `LocationNotFound`; transport and provider errors yield
    /// `Upstream`.
    ///
    /// # Errors
    /// See above; every failure mode maps to a distinct variant.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve(&self, raw_location: &str) -> Result<ResolvedLocation, WeatherError> {
        let query = raw_location.trim();
        if query.is_empty() {
            return Err(WeatherError::invalid_input("location must not be empty"));
        }

        let url = format!("{}/search", self.base_url);
        let limit = MAX_CANDIDATES.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(WeatherError::upstream_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::upstream(format!(
                "geocoding search returned status {status}"
            )));
        }

        let candidates: Vec<SearchCandidate> = response
            .json()
            .await
            .map_err(|e| WeatherError::upstream(format!("invalid geocoding response: {e}")))?;

        let best =
            select_best(&candidates).ok_or_else(|| WeatherError::location_not_found(query))?;

        let latitude: f64 = best.lat.parse().map_err(|_| {
            WeatherError::upstream(format!("non-numeric latitude '{}' in response", best.lat))
        })?;
        let longitude: f64 = best.lon.parse().map_err(|_| {
            WeatherError::upstream(format!("non-numeric longitude '{}' in response", best.lon))
        })?;

        tracing::info!(resolved = %best.display_name, "resolved location");

        Ok(ResolvedLocation { name: best.display_name.clone(), latitude, longitude })
    }

    /// Reverse geocode coordinates to a human-readable place name
    /// (e.g. "Seattle, Washington").
    /// Returns `None` on failure or timeout; the caller can fall back to
    /// raw coordinates.
    #[instrument(skip(self), level = "debug")]
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Option<String> {
        let url = format!("{}/reverse", self.base_url);
        let response = match self
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: ReverseResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let Some(addr) = body.address else {
            return body.display_name;
        };

        // Capture state/country before the place chain consumes them
        let state = addr.state.clone();
        let country = addr.country.clone();

        // Prefer city > town > village > municipality for the primary place name
        let place = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .or(addr.municipality)
            .or(addr.state_district)
            .or(addr.county)
            .or(addr.state)
            .or(addr.country)?;

        // Add state/country for disambiguation when different from place
        let suffix = state
            .filter(|s| !s.is_empty() && *s != place)
            .or_else(|| country.filter(|c| !c.is_empty() && *c != place));

        let result = match suffix {
            Some(s) => format!("{place}, {s}"),
            None => place,
        };

        tracing::debug!("Reverse geocoded to: {}", result);
        Some(result)
    }
}

/// Highest importance wins; the provider's own ordering breaks ties.
fn select_best(candidates: &[SearchCandidate]) -> Option<&SearchCandidate> {
    let mut best: Option<(&SearchCandidate, f64)> = None;
    for candidate in candidates {
        let score = candidate.importance.unwrap_or(0.0);
        match best {
            Some((_, current)) if current >= score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn candidate(name: &str, importance: Option<f64>) -> SearchCandidate {
        SearchCandidate {
            display_name: name.to_string(),
            lat: "0.0".to_string(),
            lon: "0.0".to_string(),
            importance,
        }
    }

    #[test]
    fn select_best_prefers_highest_importance() {
        let candidates = vec![
            candidate("low", Some(0.3)),
            candidate("high", Some(0.9)),
            candidate("mid", Some(0.5)),
        ];
        assert_eq!(select_best(&candidates).unwrap().display_name, "high");
    }

    #[test]
    fn select_best_breaks_ties_by_provider_order() {
        let candidates = vec![
            candidate("first", Some(0.7)),
            candidate("second", Some(0.7)),
        ];
        assert_eq!(select_best(&candidates).unwrap().display_name, "first");
    }

    #[test]
    fn select_best_treats_missing_importance_as_lowest() {
        let candidates = vec![candidate("unranked", None), candidate("ranked", Some(0.1))];
        assert_eq!(select_best(&candidates).unwrap().display_name, "ranked");
    }

    #[test]
    fn select_best_of_empty_list_is_none() {
        assert!(select_best(&[]).is_none());
    }

    #[tokio::test]
    async fn empty_input_never_reaches_the_network() {
        // An unroutable base URL: any network attempt would surface as
        // Upstream, not InvalidInput.
        let client = GeocodingClient::with_base_url("http://127.0.0.1:1").unwrap();

        let err = client.resolve("").await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidInput(_)));

        let err = client.resolve("   ").await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidInput(_)));
    }
}

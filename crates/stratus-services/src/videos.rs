//! Video search enrichment: travel videos for a record's location.

use crate::error::{ServiceError, ServiceResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

const VIDEO_API_URL: &str = "https://www.googleapis.com/youtube/v3";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_MAX_RESULTS: u32 = 5;
const MAX_RESULTS_CAP: u32 = 25;

/// One search hit, flattened for API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub channel: String,
    pub published_at: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Client for the video search provider.
#[derive(Debug, Clone)]
pub struct VideoClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl VideoClient {
    /// Client against the default endpoint. `api_key` may be absent;
    /// searches then fail with `MissingApiKey` instead of panicking.
    ///
    /// # Errors
    /// Returns `ServiceError::Upstream` if the HTTP client cannot be built.
    pub fn new(api_key: Option<String>) -> ServiceResult<Self> {
        Self::with_base_url(VIDEO_API_URL, api_key)
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

    /// Search travel videos for a location. `max_results` is capped.
    ///
    /// # Errors
    /// `MissingApiKey` without a configured key, `Upstream` on
    /// transport or provider failure.
    #[instrument(skip(self), level = "info")]
    pub async fn search(&self, location: &str, max_results: u32) -> ServiceResult<Vec<Video>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ServiceError::MissingApiKey("video search"));
        };

        let capped = max_results.clamp(1, MAX_RESULTS_CAP);
        let query = format!("{location} travel guide");
        let max_results_param = capped.to_string();
        let url = format!("{}/search", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("q", query.as_str()),
                ("type", "video"),
                ("maxResults", max_results_param.as_str()),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::upstream(format!(
                "video search returned status {status}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::upstream(format!("invalid video search response: {e}")))?;

        let videos: Vec<Video> = parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(Video {
                    url: format!("https://www.youtube.com/watch?v={video_id}"),
                    id: video_id,
                    title: item.snippet.title,
                    description: item.snippet.description,
                    thumbnail: item.snippet.thumbnails.medium.map(|t| t.url),
                    channel: item.snippet.channel_title,
                    published_at: item.snippet.published_at,
                })
            })
            .collect();

        tracing::info!(count = videos.len(), "video search completed");
        Ok(videos)
    }
}

//! HTTP REST API for the record service
//!
//! Thin mapping from routes onto the service layer; all validation and
//! orchestration lives below this file.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use stratus_services::{
    export, maps, places, videos, ExportFormat, Place, PlacesClient, RecordService, TodayOutlook,
    Video, VideoClient,
};
use stratus_store::{ListFilter, SqliteRecordStore, WeatherRecord};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecordService<SqliteRecordStore>>,
    pub videos: VideoClient,
    pub places: PlacesClient,
    pub maps_api_key: Option<String>,
}

/// JSON request for create/update
#[derive(Debug, Deserialize)]
pub struct RecordPayload {
    pub location: String,
    pub start_date: String,
    pub end_date: String,
}

/// JSON response for record lists
#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub records: Vec<WeatherRecord>,
    pub total: usize,
}

/// JSON response for video lookups
#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub location: String,
    pub videos: Vec<Video>,
    pub total: usize,
}

/// JSON response for nearby places
#[derive(Debug, Serialize)]
pub struct PlaceListResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u32,
    pub place_type: String,
    pub places: Vec<Place>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PlacesQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius: Option<u32>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoordinatesQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct MapsQuery {
    pub lat: f64,
    pub lon: f64,
    pub zoom: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/weather", post(create_record).get(list_records))
        .route("/api/weather/clear-all", delete(clear_all_records))
        .route(
            "/api/weather/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/api/today/coordinates", get(today_by_coordinates))
        .route("/api/today/{location}", get(today_outlook))
        .route("/api/export/{format}", get(export_records))
        .route("/api/videos/{location}", get(search_videos))
        .route("/api/places/nearby", get(nearby_places))
        .route("/api/maps/embed", get(maps_embed))
        .layer(cors)
        .with_state(state)
}

/// GET /api/health - storage reachability and service readiness
async fn health(State(state): State<AppState>) -> Response {
    match state.service.count() {
        Ok(records) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "timestamp": Utc::now().to_rfc3339(),
                "database": { "connected": true, "records": records },
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "status": "unhealthy",
                "timestamp": Utc::now().to_rfc3339(),
                "database": { "connected": false },
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}

/// POST /api/weather - run the pipeline and persist a record
async fn create_record(
    State(state): State<AppState>,
    Json(payload): Json<RecordPayload>,
) -> Result<(StatusCode, Json<WeatherRecord>), ApiError> {
    let record = state
        .service
        .create(
            &payload.location,
            &payload.start_date,
            &payload.end_date,
            Utc::now().date_naive(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/weather - list records with optional filters
async fn list_records(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> Result<Json<RecordListResponse>, ApiError> {
    let records = state.service.list(&filter)?;
    let total = records.len();
    Ok(Json(RecordListResponse { records, total }))
}

/// GET /api/weather/{id}
async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WeatherRecord>, ApiError> {
    Ok(Json(state.service.get(id)?))
}

/// PUT /api/weather/{id} - re-run the pipeline and replace the record
async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RecordPayload>,
) -> Result<Json<WeatherRecord>, ApiError> {
    let record = state
        .service
        .update(
            id,
            &payload.location,
            &payload.start_date,
            &payload.end_date,
            Utc::now().date_naive(),
        )
        .await?;
    Ok(Json(record))
}

/// DELETE /api/weather/{id}
async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.service.delete(id)?;
    Ok(Json(serde_json::json!({
        "message": "Weather record deleted successfully"
    })))
}

/// DELETE /api/weather/clear-all
async fn clear_all_records(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.service.clear_all()?;
    Ok(Json(serde_json::json!({
        "message": format!("Successfully deleted {deleted} weather records"),
        "deleted_count": deleted,
    })))
}

/// GET /api/today/{location} - current-day 3-hour outlook
async fn today_outlook(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<TodayOutlook>, ApiError> {
    let outlook = state.service.today_outlook(&location, Utc::now().date_naive()).await?;
    Ok(Json(outlook))
}

/// GET /api/today/coordinates - outlook for a raw coordinate pair
async fn today_by_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<TodayOutlook>, ApiError> {
    let outlook =
        state.service.today_outlook_at(query.lat, query.lon, Utc::now().date_naive()).await?;
    Ok(Json(outlook))
}

/// GET /api/export/{format} - download all records as a file
async fn export_records(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<Response, ApiError> {
    let format = ExportFormat::parse(&format)?;
    let records = state.service.list_all()?;
    let body = export::export(&records, format)?;

    let filename = format!(
        "weather_records_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        format.extension(),
    );
    let headers = [
        (header::CONTENT_TYPE, format.mime_type().to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ];
    Ok((headers, body).into_response())
}

/// GET /api/videos/{location} - travel videos for a location
async fn search_videos(
    State(state): State<AppState>,
    Path(location): Path<String>,
    Query(query): Query<VideoQuery>,
) -> Result<Json<VideoListResponse>, ApiError> {
    let max_results = query.max_results.unwrap_or(videos::DEFAULT_MAX_RESULTS);
    let found = state.videos.search(&location, max_results).await?;
    let total = found.len();
    Ok(Json(VideoListResponse { location, videos: found, total }))
}

/// GET /api/places/nearby - places around a coordinate
async fn nearby_places(
    State(state): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> Result<Json<PlaceListResponse>, ApiError> {
    let radius = query.radius.unwrap_or(places::DEFAULT_RADIUS_METERS);
    let place_type = query.place_type.unwrap_or_else(|| "restaurant".to_string());
    let found = state.places.nearby(query.lat, query.lon, radius, &place_type).await?;
    let total = found.len();
    Ok(Json(PlaceListResponse {
        latitude: query.lat,
        longitude: query.lon,
        radius,
        place_type,
        places: found,
        total,
    }))
}

/// GET /api/maps/embed - embeddable map URL for a coordinate
async fn maps_embed(
    State(state): State<AppState>,
    Query(query): Query<MapsQuery>,
) -> Json<serde_json::Value> {
    let zoom = query.zoom.unwrap_or(maps::DEFAULT_ZOOM);
    let embed_url = maps::embed_url(state.maps_api_key.as_deref(), query.lat, query.lon, zoom);
    Json(serde_json::json!({
        "latitude": query.lat,
        "longitude": query.lon,
        "zoom": zoom,
        "embed_url": embed_url,
    }))
}

//! Integration tests for the record pipeline using wiremock.
//!
//! A mock server stands in for the geocoding and weather providers; the
//! store is the real SQLite implementation, in memory.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::NaiveDate;
use stratus_services::{RecordService, ServiceError};
use stratus_store::{ListFilter, SqliteRecordStore};
use stratus_weather::{GeocodingClient, Segment, WeatherClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 6, 1)
}

fn service_for(server: &MockServer) -> RecordService<SqliteRecordStore> {
    let geocoder = GeocodingClient::with_base_url(&server.uri()).unwrap();
    let weather = WeatherClient::with_base_urls(
        &format!("{}/v1/forecast", server.uri()),
        &format!("{}/v1/archive", server.uri()),
    )
    .unwrap();
    let store = SqliteRecordStore::in_memory().unwrap();
    RecordService::new(geocoder, weather, store)
}

fn geocode_hit(query: &str, name: &str, lat: &str, lon: &str) -> Mock {
    Mock::given(method("GET")).and(path("/search")).and(query_param("q", query)).respond_with(
        ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "display_name": format!("{name} Township, PA, USA"),
                "lat": "41.0",
                "lon": "-75.0",
                "importance": 0.31,
            },
            {
                "display_name": name,
                "lat": lat,
                "lon": lon,
                "importance": 0.93,
            },
        ])),
    )
}

/// Open-Meteo style hourly payload covering `start..=end` at 3-hour steps.
fn hourly_payload(start: NaiveDate, end: NaiveDate) -> serde_json::Value {
    let mut times = Vec::new();
    let mut temps = Vec::new();
    let mut codes = Vec::new();
    let mut day = start;
    while day <= end {
        for hour in (0..24).step_by(3) {
            times.push(format!("{day}T{hour:02}:00"));
            temps.push(serde_json::json!(15.0 + hour as f64 / 10.0));
            codes.push(serde_json::json!(61));
        }
        day = day.succ_opt().unwrap();
    }
    serde_json::json!({
        "hourly": {
            "time": times,
            "temperature_2m": temps,
            "weather_code": codes,
        }
    })
}

fn forecast_hit(start: NaiveDate, end: NaiveDate) -> Mock {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("start_date", start.to_string()))
        .and(query_param("end_date", end.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_payload(start, end)))
}

#[tokio::test]
async fn create_normalizes_location_and_round_trips() {
    let mock_server = MockServer::start().await;
    geocode_hit("New Yrok", "New York, NY, USA", "40.71", "-74.01")
        .mount(&mock_server)
        .await;
    forecast_hit(date(2024, 6, 1), date(2024, 6, 7)).mount(&mock_server).await;

    let service = service_for(&mock_server);
    let record =
        service.create("New Yrok", "2024-06-01", "2024-06-07", today()).await.unwrap();

    // The canonical name replaces the raw, misspelled input.
    assert_eq!(record.location, "New York, NY, USA");
    assert!((record.latitude - 40.71).abs() < 1e-9);
    assert!((record.longitude - -74.01).abs() < 1e-9);
    assert_eq!(record.temperature_data.day_count(), 7);
    assert!(record
        .temperature_data
        .days
        .values()
        .all(|d| d.segment == Segment::Forecast && d.buckets.len() == 8));

    // get() returns exactly what the pipeline produced.
    let loaded = service.get(record.id).unwrap();
    assert_eq!(loaded.location, record.location);
    assert_eq!(loaded.start_date, date(2024, 6, 1));
    assert_eq!(loaded.end_date, date(2024, 6, 7));
    assert_eq!(loaded.temperature_data.day_count(), 7);

    // Case-insensitive substring search finds it.
    let filter = ListFilter { location: Some("new york".to_string()), ..Default::default() };
    let hits = service.list(&filter).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, record.id);
}

#[tokio::test]
async fn empty_location_is_rejected_without_any_network_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let err = service.create("   ", "2024-06-01", "2024-06-02", today()).await.unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(service.count().unwrap(), 0);
}

#[tokio::test]
async fn stale_start_date_blocks_the_weather_fetch() {
    let mock_server = MockServer::start().await;
    geocode_hit("Oslo", "Oslo, Norway", "59.91", "10.75").mount(&mock_server).await;

    // The date check fails after geocoding, so the weather provider
    // must never be contacted.
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let err = service.create("Oslo", "2023-01-01", "2023-01-07", today()).await.unwrap_err();

    match err {
        ServiceError::DateRange(reason) => {
            assert!(reason.to_string().contains("in the past"));
        }
        other => panic!("expected DateRange, got {other:?}"),
    }
    assert_eq!(service.count().unwrap(), 0);
}

#[tokio::test]
async fn weather_outage_leaves_the_store_unchanged() {
    let mock_server = MockServer::start().await;
    geocode_hit("Oslo", "Oslo, Norway", "59.91", "10.75").mount(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let before = service.count().unwrap();
    let err = service.create("Oslo", "2024-06-01", "2024-06-02", today()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Upstream(_)));
    assert_eq!(service.count().unwrap(), before);
    assert!(service.list(&ListFilter::default()).unwrap().is_empty());
}

#[tokio::test]
async fn update_nonexistent_id_fails_before_any_upstream_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let err = service
        .update(42, "Oslo", "2024-06-01", "2024-06-02", today())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(42)));
    assert_eq!(service.count().unwrap(), 0);
}

#[tokio::test]
async fn update_reruns_the_pipeline_and_preserves_created_at() {
    let mock_server = MockServer::start().await;
    geocode_hit("New Yrok", "New York, NY, USA", "40.71", "-74.01")
        .mount(&mock_server)
        .await;
    geocode_hit("Oslo", "Oslo, Norway", "59.91", "10.75").mount(&mock_server).await;
    forecast_hit(date(2024, 6, 1), date(2024, 6, 7)).mount(&mock_server).await;
    forecast_hit(date(2024, 6, 2), date(2024, 6, 3)).mount(&mock_server).await;

    let service = service_for(&mock_server);
    let created =
        service.create("New Yrok", "2024-06-01", "2024-06-07", today()).await.unwrap();

    let updated = service
        .update(created.id, "Oslo", "2024-06-02", "2024-06-03", today())
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.location, "Oslo, Norway");
    assert!((updated.latitude - 59.91).abs() < 1e-9);
    assert_eq!(updated.start_date, date(2024, 6, 2));
    assert_eq!(updated.temperature_data.day_count(), 2);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    // Coordinates and payload are recomputed, not merged.
    let loaded = service.get(created.id).unwrap();
    assert_eq!(loaded.temperature_data.day_count(), 2);
    assert!(!loaded.temperature_data.days.contains_key(&date(2024, 6, 7)));
}

#[tokio::test]
async fn delete_twice_reports_not_found() {
    let mock_server = MockServer::start().await;
    geocode_hit("Oslo", "Oslo, Norway", "59.91", "10.75").mount(&mock_server).await;
    forecast_hit(date(2024, 6, 1), date(2024, 6, 2)).mount(&mock_server).await;

    let service = service_for(&mock_server);
    let record = service.create("Oslo", "2024-06-01", "2024-06-02", today()).await.unwrap();

    service.delete(record.id).unwrap();
    let err = service.delete(record.id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = service.get(record.id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn clear_all_reports_the_removed_count() {
    let mock_server = MockServer::start().await;
    geocode_hit("Oslo", "Oslo, Norway", "59.91", "10.75").mount(&mock_server).await;
    forecast_hit(date(2024, 6, 1), date(2024, 6, 2)).mount(&mock_server).await;

    let service = service_for(&mock_server);
    service.create("Oslo", "2024-06-01", "2024-06-02", today()).await.unwrap();
    service.create("Oslo", "2024-06-01", "2024-06-02", today()).await.unwrap();

    assert_eq!(service.clear_all().unwrap(), 2);
    assert_eq!(service.count().unwrap(), 0);
}

#[tokio::test]
async fn spanning_range_persists_stitched_segments() {
    let mock_server = MockServer::start().await;
    geocode_hit("Oslo", "Oslo, Norway", "59.91", "10.75").mount(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .and(query_param("start_date", "2024-05-30"))
        .and(query_param("end_date", "2024-05-31"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hourly_payload(date(2024, 5, 30), date(2024, 5, 31))),
        )
        .mount(&mock_server)
        .await;
    forecast_hit(date(2024, 6, 1), date(2024, 6, 2)).mount(&mock_server).await;

    let service = service_for(&mock_server);
    let record = service.create("Oslo", "2024-05-30", "2024-06-02", today()).await.unwrap();

    assert_eq!(record.temperature_data.day_count(), 4);
    assert_eq!(
        record.temperature_data.days[&date(2024, 5, 31)].segment,
        Segment::Archive
    );
    assert_eq!(
        record.temperature_data.days[&date(2024, 6, 1)].segment,
        Segment::Forecast
    );
}

#[tokio::test]
async fn today_outlook_summarizes_the_dominant_condition() {
    let mock_server = MockServer::start().await;
    geocode_hit("Oslo", "Oslo, Norway", "59.91", "10.75").mount(&mock_server).await;
    forecast_hit(today(), today()).mount(&mock_server).await;

    let service = service_for(&mock_server);
    let outlook = service.today_outlook("Oslo", today()).await.unwrap();

    assert_eq!(outlook.location, "Oslo, Norway");
    assert_eq!(outlook.date, today());
    assert_eq!(outlook.total_periods, 8);
    // Every mocked bucket carries WMO code 61.
    assert_eq!(outlook.dominant_condition, "Rain");
    // Nothing is persisted by an outlook request.
    assert_eq!(service.count().unwrap(), 0);
}

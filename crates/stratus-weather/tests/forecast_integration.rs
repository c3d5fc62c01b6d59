//! Integration tests for WeatherClient using wiremock.
//!
//! The mock server exposes both the forecast and the archive endpoint;
//! the tests pin down the historical/forecast split and the missing-day
//! reporting.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::NaiveDate;
use stratus_weather::{DateRange, Segment, WeatherClient, WeatherError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Build an Open-Meteo style hourly payload covering `start..=end` at
/// 3-hour steps.
fn hourly_payload(start: NaiveDate, end: NaiveDate) -> serde_json::Value {
    let mut times = Vec::new();
    let mut temps = Vec::new();
    let mut codes = Vec::new();
    let mut day = start;
    while day <= end {
        for hour in (0..24).step_by(3) {
            times.push(format!("{day}T{hour:02}:00"));
            temps.push(serde_json::json!(10.0 + hour as f64 / 10.0));
            codes.push(serde_json::json!(3));
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

fn client_for(server: &MockServer) -> WeatherClient {
    WeatherClient::with_base_urls(
        &format!("{}/v1/forecast", server.uri()),
        &format!("{}/v1/archive", server.uri()),
    )
    .unwrap()
}

#[tokio::test]
async fn future_range_only_hits_the_forecast_endpoint() {
    let mock_server = MockServer::start().await;
    let today = date(2024, 6, 1);

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("start_date", "2024-06-01"))
        .and(query_param("end_date", "2024-06-03"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hourly_payload(date(2024, 6, 1), date(2024, 6, 3))),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let range = DateRange { start: date(2024, 6, 1), end: date(2024, 6, 3) };
    let data = client.fetch(40.71, -74.01, range, today).await.unwrap();

    assert_eq!(data.day_count(), 3);
    assert!(data.days.values().all(|d| d.segment == Segment::Forecast));
    // 8 buckets per day at 3-hour granularity
    assert_eq!(data.bucket_count(), 24);
}

#[tokio::test]
async fn spanning_range_is_stitched_without_gap_or_overlap() {
    let mock_server = MockServer::start().await;
    let today = date(2024, 6, 3);

    // Archive serves strictly-past days.
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .and(query_param("start_date", "2024-06-01"))
        .and(query_param("end_date", "2024-06-02"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hourly_payload(date(2024, 6, 1), date(2024, 6, 2))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    // Forecast serves today onward.
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("start_date", "2024-06-03"))
        .and(query_param("end_date", "2024-06-05"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hourly_payload(date(2024, 6, 3), date(2024, 6, 5))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let range = DateRange { start: date(2024, 6, 1), end: date(2024, 6, 5) };
    let data = client.fetch(40.71, -74.01, range, today).await.unwrap();

    assert_eq!(data.day_count(), 5);
    // Every requested day is present exactly once, tagged by segment.
    for day in range.days() {
        let series = data.days.get(&day).unwrap();
        let expected = if day < today { Segment::Archive } else { Segment::Forecast };
        assert_eq!(series.segment, expected, "wrong segment for {day}");
    }
}

#[tokio::test]
async fn missing_days_are_reported_not_fabricated() {
    let mock_server = MockServer::start().await;
    let today = date(2024, 6, 1);

    // Provider only covers two of the three requested days.
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hourly_payload(date(2024, 6, 1), date(2024, 6, 2))),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let range = DateRange { start: date(2024, 6, 1), end: date(2024, 6, 3) };
    let err = client.fetch(40.71, -74.01, range, today).await.unwrap_err();

    match err {
        WeatherError::NoDataForRange { missing } => {
            assert_eq!(missing, vec![date(2024, 6, 3)]);
        }
        other => panic!("expected NoDataForRange, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_outage_is_upstream() {
    let mock_server = MockServer::start().await;
    let today = date(2024, 6, 1);

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let range = DateRange { start: date(2024, 6, 1), end: date(2024, 6, 2) };
    let err = client.fetch(40.71, -74.01, range, today).await.unwrap_err();

    assert!(matches!(err, WeatherError::Upstream(_)));
}

use anyhow::{Context, Result};
use std::sync::Arc;

use stratus_server::{router, AppState, Config};
use stratus_services::{PlacesClient, RecordService, VideoClient};
use stratus_store::SqliteRecordStore;
use stratus_weather::{GeocodingClient, WeatherClient};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let (config, validation) = Config::load_validated()?;
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    let geocoder = GeocodingClient::with_base_url(&config.weather.geocoding_url)?;
    let weather =
        WeatherClient::with_base_urls(&config.weather.forecast_url, &config.weather.archive_url)?;

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }
    let store = SqliteRecordStore::new(&config.database.path)
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;

    let service = Arc::new(RecordService::new(geocoder, weather, store));
    let state = AppState {
        service,
        videos: VideoClient::new(config.enrichment.video_api_key.clone())?,
        places: PlacesClient::new(config.enrichment.places_api_key.clone())?,
        maps_api_key: config.enrichment.maps_api_key.clone(),
    };

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Stratus listening on {addr}");
    axum::serve(listener, app).await.context("Server exited with error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

//! Server configuration: TOML file with environment overrides for
//! secrets. Validation distinguishes hard errors from warnings so a
//! misconfigured enrichment key degrades a feature instead of blocking
//! startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub weather: WeatherProviderConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|dir| dir.join("stratus").join("records.db"))
            .unwrap_or_else(|| PathBuf::from("records.db"));
        Self { path: path.to_string_lossy().into_owned() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherProviderConfig {
    /// Nominatim-compatible geocoding search endpoint.
    pub geocoding_url: String,
    /// Open-Meteo style forecast endpoint (today onward).
    pub forecast_url: String,
    /// Open-Meteo style archive endpoint (strictly past days).
    pub archive_url: String,
}

impl Default for WeatherProviderConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://nominatim.openstreetmap.org".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            archive_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// API key for video search (optional, can be set via environment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_api_key: Option<String>,
    /// API key for nearby places (optional, can be set via environment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub places_api_key: Option<String>,
    /// API key for map embeds (optional, can be set via environment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_api_key: Option<String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            video_api_key: std::env::var("STRATUS_VIDEO_API_KEY").ok(),
            places_api_key: std::env::var("STRATUS_PLACES_API_KEY").ok(),
            maps_api_key: std::env::var("STRATUS_MAPS_API_KEY").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            weather: WeatherProviderConfig::default(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist.
    ///
    /// The path comes from `STRATUS_CONFIG` when set, otherwise the
    /// platform config directory.
    ///
    /// # Errors
    /// Fails when the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load configuration and validate it.
    ///
    /// Returns the config along with any validation warnings.
    ///
    /// # Errors
    /// Fails when loading fails or validation reports hard errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!("Configuration validation failed: {}", validation.error_summary());
        }

        Ok((config, validation))
    }

    /// Validate the configuration.
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.server.host.trim().is_empty() {
            result.add_error("server.host", "Host must not be empty");
        }
        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }

        if self.database.path.trim().is_empty() {
            result.add_error("database.path", "Database path must not be empty");
        }

        self.validate_url(&self.weather.geocoding_url, "weather.geocoding_url", &mut result);
        self.validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);
        self.validate_url(&self.weather.archive_url, "weather.archive_url", &mut result);

        if self.enrichment.video_api_key.is_none() {
            result.add_warning("enrichment.video_api_key", "Not set - video search disabled");
        }
        if self.enrichment.places_api_key.is_none() {
            result.add_warning("enrichment.places_api_key", "Not set - nearby places disabled");
        }
        if self.enrichment.maps_api_key.is_none() {
            result.add_warning(
                "enrichment.maps_api_key",
                "Not set - map embeds fall back to keyless URLs",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {e}"));
            }
        }
    }

    /// Save configuration to file.
    ///
    /// # Errors
    /// Fails when the directory cannot be created or the file written.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("STRATUS_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let config_dir =
            dirs::config_dir().context("Failed to get config directory")?.join("stratus");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn zero_port_is_an_error() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "server.port"));
    }

    #[test]
    fn invalid_provider_url_is_an_error() {
        let mut config = Config::default();
        config.weather.forecast_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.forecast_url"));
    }

    #[test]
    fn non_http_scheme_is_an_error() {
        let mut config = Config::default();
        config.weather.geocoding_url = "ftp://example.com".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn missing_enrichment_keys_are_warnings_only() {
        let mut config = Config::default();
        config.enrichment =
            EnrichmentConfig { video_api_key: None, places_api_key: None, maps_api_key: None };
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "enrichment.video_api_key"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.server.port = 9090;
        config.enrichment.video_api_key = Some("KEY".to_string());

        let contents = toml::to_string_pretty(&config).unwrap();
        std::fs::write(&path, contents).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, 9090);
        assert_eq!(loaded.enrichment.video_api_key.as_deref(), Some("KEY"));
    }

    #[test]
    fn validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}

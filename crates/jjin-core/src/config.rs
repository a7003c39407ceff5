//! Settings file at `<config_dir>/jjin/config.toml`.
//!
//! Every section falls back to defaults, so a partial file is fine. API keys
//! may also come from the environment, which wins over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `weather.api_key`.
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
/// Environment variable that overrides `outfit.api_key`.
pub const OUTFIT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Longest request timeout accepted for any service.
const MAX_TIMEOUT_SECS: u64 = 600;

/// One problem found by [`Config::validate`].
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors block startup; warnings are only logged.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigIssue>,
    pub warnings: Vec<ConfigIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors as `field: message` joined with `; `.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the SQLite cache lives
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub outfit: OutfitConfig,

    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key
    #[serde(default)]
    pub api_key: String,

    /// One Call endpoint base URL
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Per-request deadline in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Decimal places kept when rounding coordinates into a cache key
    #[serde(default = "default_cache_precision")]
    pub cache_precision: u32,

    /// A cached forecast younger than this is served without a network call.
    /// 0 disables reuse.
    #[serde(default = "default_reuse_minutes")]
    pub reuse_minutes: u32,
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_cache_precision() -> u32 {
    2
}

fn default_reuse_minutes() -> u32 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_weather_base_url(),
            temperature_unit: TemperatureUnit::Auto,
            request_timeout_secs: default_request_timeout_secs(),
            cache_precision: default_cache_precision(),
            reuse_minutes: default_reuse_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitConfig {
    /// OpenAI API key (sent as a bearer token)
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_outfit_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    #[serde(default = "default_image_size")]
    pub image_size: String,

    /// Per-request deadline in seconds. Image generation is slow.
    #[serde(default = "default_outfit_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_outfit_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_outfit_timeout_secs() -> u64 {
    60
}

impl OutfitConfig {
    /// Deadline for a whole outfit attempt: recommendation then image.
    pub fn attempt_deadline(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.saturating_mul(2))
    }
}

impl Default for OutfitConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_outfit_base_url(),
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            image_size: default_image_size(),
            request_timeout_secs: default_outfit_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "JJinWeather/0.1.0".to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Device position used in place of a platform location service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Whether the user has granted location access
    #[serde(default)]
    pub permission_granted: bool,
}

impl LocationConfig {
    /// The configured coordinate pair, if both halves are present.
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Y-axis quantization step for temperature graphs
    pub graph_step: i32,

    /// Number of hourly entries drawn in the hourly graph
    pub hourly_graph_hours: usize,

    /// Smallest bar height as a fraction of the graph height
    pub min_bar_fraction: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            graph_step: 5,
            hourly_graph_hours: 24,
            min_bar_fraction: 0.05,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jjin")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            weather: WeatherConfig::default(),
            outfit: OutfitConfig::default(),
            geocoding: GeocodingConfig::default(),
            location: LocationConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default path, writing defaults there on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents =
                std::fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::Parse(format!("{}: {}", config_path.display(), e)))?
        } else {
            tracing::info!("Writing default config to {}", config_path.display());
            let config = Self::default();
            config.save_to(config_path)?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// [`load`](Self::load) then [`validate`](Self::validate). Fails with
    /// `ConfigError::Invalid` on errors and logs each warning.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(WEATHER_API_KEY_ENV) {
            if !key.is_empty() {
                self.weather.api_key = key;
            }
        }
        if let Ok(key) = std::env::var(OUTFIT_API_KEY_ENV) {
            if !key.is_empty() {
                self.outfit.api_key = key;
            }
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        Self::validate_url(&self.outfit.base_url, "outfit.base_url", &mut result);
        Self::validate_url(&self.geocoding.base_url, "geocoding.base_url", &mut result);

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }
        if self.outfit.request_timeout_secs == 0 {
            result.add_error(
                "outfit.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }
        for (field, secs) in [
            ("weather.request_timeout_secs", self.weather.request_timeout_secs),
            ("outfit.request_timeout_secs", self.outfit.request_timeout_secs),
        ] {
            if secs > MAX_TIMEOUT_SECS {
                result.add_error(
                    field,
                    format!("Request timeout must be at most {} seconds", MAX_TIMEOUT_SECS),
                );
            }
        }

        if self.weather.cache_precision > 6 {
            result.add_warning(
                "weather.cache_precision",
                "More than 6 decimals defeats rounding of GPS jitter",
            );
        }

        if self.weather.api_key.is_empty() {
            result.add_warning(
                "weather.api_key",
                format!("Not set - export {} or add it to the config", WEATHER_API_KEY_ENV),
            );
        }
        if self.outfit.api_key.is_empty() {
            result.add_warning(
                "outfit.api_key",
                "Not set - outfit recommendations will be unavailable",
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be within [-90, 90]");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error("location.longitude", "Longitude must be within [-180, 180]");
                }
            }
            (None, None) => {}
            _ => result.add_error(
                "location",
                "Latitude and longitude must be set together",
            ),
        }

        if self.ui.graph_step <= 0 {
            result.add_error("ui.graph_step", "Graph step must be greater than 0");
        }
        if self.ui.hourly_graph_hours == 0 {
            result.add_warning("ui.hourly_graph_hours", "Hourly graph disabled (0 hours)");
        }
        if !(0.0..=1.0).contains(&self.ui.min_bar_fraction) {
            result.add_error("ui.min_bar_fraction", "Must be a fraction within [0, 1]");
        }

        result
    }

    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
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
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// SQLite file holding the forecast cache, tracked location and
    /// preferences.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("weather.db")
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("jjin");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_missing_api_keys_are_warnings() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.api_key"));
        assert!(result.warnings.iter().any(|w| w.field == "outfit.api_key"));
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.weather.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.outfit.base_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.weather.request_timeout_secs = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "weather.request_timeout_secs"));
    }

    #[test]
    fn test_huge_timeout_rejected() {
        let mut config = Config::default();
        config.outfit.request_timeout_secs = u64::MAX;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "outfit.request_timeout_secs"));

        // Still computable when validation is bypassed
        assert_eq!(
            config.outfit.attempt_deadline(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_outfit_attempt_deadline_covers_both_calls() {
        let config = OutfitConfig::default();
        assert_eq!(config.attempt_deadline(), Duration::from_secs(120));
    }

    #[test]
    fn test_half_configured_location_rejected() {
        let mut config = Config::default();
        config.location.latitude = Some(37.5);
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "location"));
    }

    #[test]
    fn test_out_of_range_location_rejected() {
        let mut config = Config::default();
        config.location.latitude = Some(91.0);
        config.location.longitude = Some(10.0);
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location.latitude"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather\nbase_url = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_partial_ui_section_keeps_defaults() {
        let config: Config = toml::from_str("[ui]\ngraph_step = 10\n").unwrap();
        assert_eq!(config.ui.graph_step, 10);
        assert_eq!(config.ui.hourly_graph_hours, 24);
        assert_eq!(config.weather.request_timeout_secs, 10);
    }

    #[test]
    fn test_load_from_creates_defaults_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.ui.graph_step, 5);

        std::fs::write(
            &path,
            r#"
            data_dir = "/tmp/jjin-test"

            [weather]
            temperature_unit = "fahrenheit"
            request_timeout_secs = 3

            [location]
            latitude = 37.4979
            longitude = 127.0276
            permission_granted = true
            "#,
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(loaded.weather.request_timeout_secs, 3);
        assert_eq!(loaded.weather.cache_precision, 2);
        assert_eq!(loaded.location.coordinate(), Some((37.4979, 127.0276)));
        assert!(loaded.location.permission_granted);
        assert_eq!(loaded.outfit.chat_model, "gpt-4o-mini");
    }
}

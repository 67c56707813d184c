//! Configuration management for the weatherbot crate
//!
//! Handles loading configuration from an optional TOML file and environment
//! variables. The two deployment-facing variables are `REPORT_SOURCE_URL`
//! (the bulletin page to scrape) and `FORECAST_API_KEY` (the forecast
//! provider credential); both override whatever the file provides.
//!
//! The loaded struct is constructed once at startup and passed into each
//! component; nothing reads configuration from process-wide state afterwards.

use crate::WeatherBotError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Root configuration structure for the weatherbot crate
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherBotConfig {
    /// Report page scraping configuration
    #[serde(default)]
    pub report: ReportConfig,
    /// Forecast API configuration
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Report page scraping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// URL of the weather bulletin page to scrape
    pub source_url: Option<String>,
    /// Request timeout in seconds (hard cutoff, not retried)
    #[serde(default = "default_report_timeout")]
    pub timeout_seconds: u32,
    /// Path of the JSON snapshot of the last scraped report
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

/// Forecast API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Forecast provider API key
    pub api_key: Option<String>,
    /// Base URL of the forecast endpoint
    #[serde(default = "default_forecast_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (hard cutoff, not retried)
    #[serde(default = "default_forecast_timeout")]
    pub timeout_seconds: u32,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_report_timeout() -> u32 {
    2
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("weather_report.json")
}

fn default_forecast_base_url() -> String {
    "https://api.openweathermap.org/data/3.0/onecall".to_string()
}

fn default_forecast_timeout() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            timeout_seconds: default_report_timeout(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_forecast_base_url(),
            timeout_seconds: default_forecast_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WeatherBotConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("WEATHERBOT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherBotConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherbot").join("config.toml"))
    }

    /// Apply the deployment environment variables on top of any file values.
    /// `REPORT_SOURCE_URL` and `FORECAST_API_KEY` are authoritative.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("REPORT_SOURCE_URL") {
            if !url.is_empty() {
                self.report.source_url = Some(url);
            }
        }
        if let Ok(key) = env::var("FORECAST_API_KEY") {
            if !key.is_empty() {
                self.forecast.api_key = Some(key);
            }
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_urls()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_urls(&self) -> Result<()> {
        if let Some(url) = &self.report.source_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherBotError::config(
                    "Report source URL must be a valid HTTP or HTTPS URL",
                )
                .into());
            }
        }

        if !self.forecast.base_url.starts_with("http://")
            && !self.forecast.base_url.starts_with("https://")
        {
            return Err(WeatherBotError::config(
                "Forecast API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        // Timeouts are hard upper bounds on user-visible latency; a chat
        // handler must never block for more than a few seconds.
        if self.report.timeout_seconds == 0 || self.report.timeout_seconds > 30 {
            return Err(WeatherBotError::config(
                "Report fetch timeout must be between 1 and 30 seconds",
            )
            .into());
        }

        if self.forecast.timeout_seconds == 0 || self.forecast.timeout_seconds > 30 {
            return Err(WeatherBotError::config(
                "Forecast API timeout must be between 1 and 30 seconds",
            )
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherBotError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherBotError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if let Some(key) = &self.forecast.api_key {
            if key.is_empty() {
                return Err(WeatherBotError::config(
                    "Forecast API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WeatherBotConfig::default();
        assert!(config.report.source_url.is_none());
        assert_eq!(config.report.timeout_seconds, 2);
        assert_eq!(config.report.snapshot_path, PathBuf::from("weather_report.json"));
        assert!(config.forecast.api_key.is_none());
        assert_eq!(
            config.forecast.base_url,
            "https://api.openweathermap.org/data/3.0/onecall"
        );
        assert_eq!(config.forecast.timeout_seconds, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_config_validates() {
        let config = WeatherBotConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_source_url() {
        let mut config = WeatherBotConfig::default();
        config.report.source_url = Some("ftp://weather.example.org/report".to_string());
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Report source URL"));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = WeatherBotConfig::default();
        config.forecast.timeout_seconds = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    fn test_validation_rejects_empty_api_key() {
        let mut config = WeatherBotConfig::default();
        config.forecast.api_key = Some(String::new());
        let result = config.validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_log_level() {
        let mut config = WeatherBotConfig::default();
        config.logging.level = "verbose".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        // SAFETY: Test environment, setting test values only
        unsafe {
            env::set_var("REPORT_SOURCE_URL", "https://weather.example.org/bulletin");
            env::set_var("FORECAST_API_KEY", "key_from_env");
        }

        let mut config = WeatherBotConfig::default();
        config.forecast.api_key = Some("key_from_file".to_string());
        config.apply_env_overrides();

        // SAFETY: Test cleanup
        unsafe {
            env::remove_var("REPORT_SOURCE_URL");
            env::remove_var("FORECAST_API_KEY");
        }

        assert_eq!(
            config.report.source_url.as_deref(),
            Some("https://weather.example.org/bulletin")
        );
        assert_eq!(config.forecast.api_key.as_deref(), Some("key_from_env"));
    }

    #[test]
    fn test_config_path_generation() {
        let path = WeatherBotConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("weatherbot"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}

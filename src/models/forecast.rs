//! Forecast query and result models

use crate::WeatherBotError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of hourly entries carried in a forecast
pub const MAX_HOURLY_POINTS: usize = 48;

/// Geographic forecast query, validated at the boundary
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Location {
    /// Create a validated location.
    ///
    /// Rejects non-finite values and coordinates outside the valid ranges so
    /// downstream code never builds a request URL from garbage input.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherBotError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(WeatherBotError::input(
                "Coordinates must be finite numbers",
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherBotError::input(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherBotError::input(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Forecast result: current conditions, active alerts, and the hourly outlook
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Forecast {
    /// Current temperature in Celsius
    pub current_temp: f64,
    /// Current feels-like temperature in Celsius
    pub current_feels_like: f64,
    /// Current conditions description as provided by the API
    pub current_description: String,
    /// Active weather alerts for the area
    pub alerts: Vec<Alert>,
    /// Hourly entries, chronological, at most [`MAX_HOURLY_POINTS`]
    pub hourly: Vec<HourlyPoint>,
    /// UTC offset of the forecast location in seconds
    pub timezone_offset_seconds: i32,
}

/// A weather alert issued for the forecast area
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Alert {
    /// Issuing authority
    pub sender: String,
    /// Alert event name
    pub event: String,
    /// Full alert description
    pub description: String,
}

/// One hourly forecast entry
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HourlyPoint {
    /// Timestamp of this entry
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Conditions description as provided by the API
    pub description: String,
}

//! Forecast retrieval and formatting
//!
//! Calls the One Call forecast API for a validated location and renders the
//! multi-hour outlook as a single chat-ready string with derived warning
//! lines prepended. The text path is total: every failure kind is converted
//! to its fixed user-facing message and never escapes as an error.

use crate::Result;
use crate::config::ForecastConfig;
use crate::error::WeatherBotError;
use crate::models::forecast::MAX_HOURLY_POINTS;
use crate::models::{Forecast, Location};
use chrono::{FixedOffset, Offset, Timelike, Utc};
use reqwest::blocking::Client;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Temperature above which an extreme-heat warning is derived, in Celsius
const HEAT_WARNING_THRESHOLD: f64 = 35.0;
/// Temperature below which a freezing warning is derived, in Celsius
const FREEZE_WARNING_THRESHOLD: f64 = 0.0;

/// Client for the geographic forecast API
pub struct ForecastClient {
    client: Client,
    config: ForecastConfig,
}

impl ForecastClient {
    /// Create a new forecast client from forecast configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("weatherbot/0.1.0")
            .build()
            .map_err(|e| WeatherBotError::general(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Fetch and render the forecast for raw coordinates.
    ///
    /// Never fails: input validation, configuration, network, and any other
    /// failure all collapse to their fixed user-facing strings. The chat
    /// layer forwards the returned text as-is.
    pub fn get_forecast_text(&self, latitude: f64, longitude: f64) -> String {
        let location = match Location::new(latitude, longitude) {
            Ok(location) => location,
            Err(e) => {
                warn!("Rejected forecast input: {e}");
                return e.user_message();
            }
        };

        match self.get_forecast_data(&location) {
            Ok(forecast) => render_forecast(&forecast),
            Err(e) => {
                error!("Forecast retrieval failed: {e}");
                e.user_message()
            }
        }
    }

    /// Fetch the forecast payload for a validated location.
    ///
    /// Fails with `Config` when no API key is configured and `Network` when
    /// the request errors, times out (hard cutoff, not retried), returns a
    /// non-success status, or yields an unparseable body.
    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    pub fn get_forecast_data(&self, location: &Location) -> Result<Forecast> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                WeatherBotError::config(
                    "Missing forecast API key. Set FORECAST_API_KEY in the environment.",
                )
            })?;

        let url = format!(
            "{}?lat={}&lon={}&units=metric&appid={}",
            self.config.base_url,
            location.latitude,
            location.longitude,
            urlencoding::encode(api_key)
        );

        // The URL carries the credential, so it is never logged
        debug!("Requesting forecast");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| WeatherBotError::network(format!("Forecast request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherBotError::network(format!(
                "Forecast API returned HTTP {status}"
            )));
        }

        let payload: onecall::OneCallResponse = response.json().map_err(|e| {
            WeatherBotError::network(format!("Failed to parse forecast response: {e}"))
        })?;

        let forecast = Forecast::from(payload);
        info!(
            hours = forecast.hourly.len(),
            alerts = forecast.alerts.len(),
            "Retrieved forecast"
        );

        Ok(forecast)
    }
}

/// Render a forecast as the chat-ready outlook text.
///
/// Hourly lines stay in chronological input order. Warnings derived during
/// the pass (storm keywords, extreme heat, freezing temperatures) and the
/// API's own alerts are deduplicated, sorted lexicographically, and
/// prepended as a block separated from the body by a blank line.
#[must_use]
pub fn render_forecast(forecast: &Forecast) -> String {
    let offset = FixedOffset::east_opt(forecast.timezone_offset_seconds)
        .unwrap_or_else(|| Utc.fix());

    let mut body = String::from("48-Hour Forecast for location provided:\n\n");
    let mut warnings: Vec<String> = Vec::new();

    for alert in &forecast.alerts {
        warnings.push(format!(
            "** ALERT from {}: {} **\n{}",
            alert.sender, alert.event, alert.description
        ));
    }

    let _ = writeln!(
        body,
        "The current temperature is {}°C, feels like {}°C with {}.\n",
        forecast.current_temp,
        forecast.current_feels_like,
        capitalize(&forecast.current_description)
    );
    body.push_str("Time: Temperature, Weather Description\n");

    for point in forecast.hourly.iter().take(MAX_HOURLY_POINTS) {
        let local = point.timestamp.with_timezone(&offset);
        let time_str = local.format("%I:%M %p").to_string();

        // Midnight rollover in the forecast location's local time gets a
        // date marker line before the hourly entry
        if local.hour() == 0 {
            let _ = writeln!(body, "{} ", local.date_naive());
        }
        let _ = writeln!(
            body,
            "{}: {}°C, {}",
            time_str,
            point.temperature,
            capitalize(&point.description)
        );

        let description = point.description.to_lowercase();
        if description.contains("storm") || description.contains("thunder") {
            warnings.push(format!("** WARNING: Potential storm around {time_str}! **"));
        }
        if point.temperature > HEAT_WARNING_THRESHOLD {
            warnings.push(format!(
                "** WARNING: Extreme heat (>35°C) around {time_str}! **"
            ));
        }
        if point.temperature < FREEZE_WARNING_THRESHOLD {
            warnings.push(format!(
                "** WARNING: Freezing temperatures (<0°C) around {time_str}! **"
            ));
        }
    }

    if warnings.is_empty() {
        body
    } else {
        let unique: BTreeSet<String> = warnings.into_iter().collect();
        let warning_block = unique.into_iter().collect::<Vec<_>>().join("\n");
        format!("{warning_block}\n\n{body}")
    }
}

/// Uppercase the first character and lowercase the rest
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// One Call API response structures and conversion
mod onecall {
    use super::MAX_HOURLY_POINTS;
    use crate::models::{Alert, Forecast, HourlyPoint};
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    /// Forecast response from the One Call API
    #[derive(Debug, Deserialize)]
    pub struct OneCallResponse {
        #[serde(default)]
        pub timezone_offset: i32,
        pub current: CurrentData,
        #[serde(default)]
        pub alerts: Vec<AlertData>,
        #[serde(default)]
        pub hourly: Vec<HourlyData>,
    }

    /// Current conditions block
    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        pub temp: f64,
        pub feels_like: f64,
        #[serde(default)]
        pub weather: Vec<ConditionData>,
    }

    /// One entry of a `weather` array
    #[derive(Debug, Deserialize)]
    pub struct ConditionData {
        pub description: String,
    }

    /// Government weather alert entry
    #[derive(Debug, Deserialize)]
    pub struct AlertData {
        pub sender_name: String,
        pub event: String,
        pub description: String,
    }

    /// One hourly forecast entry
    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        pub dt: i64,
        pub temp: f64,
        #[serde(default)]
        pub weather: Vec<ConditionData>,
    }

    impl From<OneCallResponse> for Forecast {
        fn from(response: OneCallResponse) -> Self {
            let current_description = response
                .current
                .weather
                .into_iter()
                .next()
                .map(|w| w.description)
                .unwrap_or_default();

            let alerts = response
                .alerts
                .into_iter()
                .map(|a| Alert {
                    sender: a.sender_name,
                    event: a.event,
                    description: a.description,
                })
                .collect();

            let hourly = response
                .hourly
                .into_iter()
                .take(MAX_HOURLY_POINTS)
                .map(|h| HourlyPoint {
                    timestamp: DateTime::from_timestamp(h.dt, 0).unwrap_or_else(Utc::now),
                    temperature: h.temp,
                    description: h
                        .weather
                        .into_iter()
                        .next()
                        .map(|w| w.description)
                        .unwrap_or_default(),
                })
                .collect();

            Self {
                current_temp: response.current.temp,
                current_feels_like: response.current.feels_like,
                current_description,
                alerts,
                hourly,
                timezone_offset_seconds: response.timezone_offset,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Alert, HourlyPoint};
    use chrono::DateTime;
    use rstest::rstest;

    // 2024-07-01T12:00:00Z
    const NOON: i64 = 1_719_835_200;
    const HOUR: i64 = 3_600;

    fn point(ts: i64, temp: f64, description: &str) -> HourlyPoint {
        HourlyPoint {
            timestamp: DateTime::from_timestamp(ts, 0).unwrap(),
            temperature: temp,
            description: description.to_string(),
        }
    }

    fn forecast_with(hourly: Vec<HourlyPoint>) -> Forecast {
        Forecast {
            current_temp: 18.5,
            current_feels_like: 17.2,
            current_description: "scattered clouds".to_string(),
            alerts: Vec::new(),
            hourly,
            timezone_offset_seconds: 0,
        }
    }

    #[rstest]
    #[case(36.0, "clear sky", "Extreme heat")]
    #[case(-1.0, "clear sky", "Freezing temperatures")]
    #[case(20.0, "thunderstorm", "Potential storm")]
    #[case(20.0, "Tropical Storm approaching", "Potential storm")]
    fn test_warning_derivation(
        #[case] temp: f64,
        #[case] description: &str,
        #[case] expected: &str,
    ) {
        let text = render_forecast(&forecast_with(vec![point(NOON, temp, description)]));
        assert!(text.contains(expected), "missing '{expected}' in:\n{text}");
    }

    #[rstest]
    #[case(35.0, "Extreme heat")]
    #[case(0.0, "Freezing temperatures")]
    #[case(20.0, "Potential storm")]
    fn test_threshold_boundaries_produce_no_warning(
        #[case] temp: f64,
        #[case] absent: &str,
    ) {
        let text = render_forecast(&forecast_with(vec![point(NOON, temp, "light rain")]));
        assert!(!text.contains(absent));
        assert!(text.starts_with("48-Hour Forecast"));
    }

    #[test]
    fn test_duplicate_warnings_are_collapsed() {
        // Same wall-clock time on consecutive days yields the same warning
        // string; set semantics keep exactly one copy
        let text = render_forecast(&forecast_with(vec![
            point(NOON, 20.0, "thunderstorm"),
            point(NOON + 24 * HOUR, 21.0, "thunderstorm"),
        ]));
        assert_eq!(text.matches("Potential storm").count(), 1);
        // Both hourly lines survive
        assert_eq!(text.matches("Thunderstorm").count(), 2);
    }

    #[test]
    fn test_warning_block_precedes_body() {
        let text = render_forecast(&forecast_with(vec![point(NOON, 40.0, "clear sky")]));
        let warning_pos = text.find("Extreme heat").unwrap();
        let header_pos = text.find("48-Hour Forecast").unwrap();
        assert!(warning_pos < header_pos);
        // Block and body separated by a blank line
        assert!(text.contains("! **\n\n48-Hour Forecast"));
    }

    #[test]
    fn test_warnings_sorted_lexicographically() {
        let text = render_forecast(&forecast_with(vec![
            point(NOON, 40.0, "clear sky"),
            point(NOON + HOUR, -5.0, "snow"),
        ]));
        let heat = text.find("Extreme heat").unwrap();
        let freezing = text.find("Freezing temperatures").unwrap();
        assert!(heat < freezing);
    }

    #[test]
    fn test_hourly_lines_keep_chronological_order() {
        // The freeze hour comes first in time but its warning sorts after
        // the heat warning; the hourly body must not be reordered
        let text = render_forecast(&forecast_with(vec![
            point(NOON, -5.0, "snow"),
            point(NOON + HOUR, 40.0, "clear sky"),
            point(NOON + 2 * HOUR, 15.0, "light rain"),
        ]));
        let heat_warning = text.find("Extreme heat").unwrap();
        let freeze_warning = text.find("Freezing temperatures").unwrap();
        assert!(heat_warning < freeze_warning);

        let first = text.find("12:00 PM: -5°C").unwrap();
        let second = text.find("01:00 PM: 40°C").unwrap();
        let third = text.find("02:00 PM: 15°C").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_midnight_rollover_inserts_date_marker() {
        // 2024-07-01T23:00Z, then 2024-07-02T00:00Z
        let text = render_forecast(&forecast_with(vec![
            point(NOON + 11 * HOUR, 15.0, "clear sky"),
            point(NOON + 12 * HOUR, 14.0, "clear sky"),
        ]));
        let marker = text.find("2024-07-02 \n").unwrap();
        let midnight_line = text.find("12:00 AM: 14°C").unwrap();
        assert!(marker < midnight_line);
    }

    #[test]
    fn test_midnight_uses_forecast_location_offset() {
        // 2024-06-30T23:00Z is 2024-07-01T00:00 at UTC+1
        let mut forecast = forecast_with(vec![point(NOON - 13 * HOUR, 15.0, "clear sky")]);
        forecast.timezone_offset_seconds = 3_600;
        let text = render_forecast(&forecast);
        assert!(text.contains("2024-07-01 \n"));
        assert!(text.contains("12:00 AM: 15°C"));
    }

    #[test]
    fn test_current_conditions_line() {
        let text = render_forecast(&forecast_with(Vec::new()));
        assert!(text.contains(
            "The current temperature is 18.5°C, feels like 17.2°C with Scattered clouds."
        ));
        assert!(text.contains("Time: Temperature, Weather Description"));
    }

    #[test]
    fn test_alerts_join_the_warning_block() {
        let mut forecast = forecast_with(vec![point(NOON, 20.0, "clear sky")]);
        forecast.alerts.push(Alert {
            sender: "Met Office".to_string(),
            event: "Yellow wind warning".to_string(),
            description: "Gusts up to 90 km/h expected.".to_string(),
        });
        let text = render_forecast(&forecast);
        let alert = text
            .find("** ALERT from Met Office: Yellow wind warning **\nGusts up to 90 km/h expected.")
            .unwrap();
        let header = text.find("48-Hour Forecast").unwrap();
        assert!(alert < header);
    }

    #[test]
    fn test_hourly_rendering_caps_at_48_entries() {
        let hourly: Vec<HourlyPoint> = (0..60)
            .map(|i| point(NOON + i * HOUR, 15.0, "clear sky"))
            .collect();
        let text = render_forecast(&forecast_with(hourly));
        assert_eq!(text.matches("°C, Clear sky").count(), 48);
    }

    #[test]
    fn test_missing_api_key_returns_fixed_config_message() {
        let client = ForecastClient::new(ForecastConfig::default()).unwrap();
        let text = client.get_forecast_text(51.5074, -0.144);
        assert_eq!(
            text,
            "Sorry, the forecast service is not configured. Please try again later."
        );
    }

    #[test]
    fn test_invalid_location_returns_fixed_input_message() {
        let client = ForecastClient::new(ForecastConfig::default()).unwrap();
        let text = client.get_forecast_text(f64::NAN, 400.0);
        assert_eq!(
            text,
            "Invalid location provided. Please share a valid location."
        );
    }

    #[test]
    fn test_onecall_payload_conversion() {
        let json = r#"{
            "timezone_offset": 7200,
            "current": {
                "temp": 21.4,
                "feels_like": 20.9,
                "weather": [{"description": "broken clouds"}]
            },
            "alerts": [{
                "sender_name": "DWD",
                "event": "Thunderstorm warning",
                "description": "Severe thunderstorms this evening."
            }],
            "hourly": [
                {"dt": 1719835200, "temp": 22.1, "weather": [{"description": "light rain"}]},
                {"dt": 1719838800, "temp": 23.0, "weather": []}
            ]
        }"#;

        let payload: onecall::OneCallResponse = serde_json::from_str(json).unwrap();
        let forecast = Forecast::from(payload);

        assert_eq!(forecast.current_temp, 21.4);
        assert_eq!(forecast.current_description, "broken clouds");
        assert_eq!(forecast.timezone_offset_seconds, 7200);
        assert_eq!(forecast.alerts.len(), 1);
        assert_eq!(forecast.alerts[0].sender, "DWD");
        assert_eq!(forecast.hourly.len(), 2);
        assert_eq!(forecast.hourly[0].temperature, 22.1);
        assert_eq!(forecast.hourly[1].description, "");
    }

    #[test]
    fn test_onecall_conversion_truncates_hourly_to_48() {
        let hourly: Vec<String> = (0..60)
            .map(|i| {
                format!(
                    r#"{{"dt": {}, "temp": 15.0, "weather": [{{"description": "clear sky"}}]}}"#,
                    NOON + i * HOUR
                )
            })
            .collect();
        let json = format!(
            r#"{{"current": {{"temp": 15.0, "feels_like": 14.0, "weather": []}}, "hourly": [{}]}}"#,
            hourly.join(",")
        );

        let payload: onecall::OneCallResponse = serde_json::from_str(&json).unwrap();
        let forecast = Forecast::from(payload);
        assert_eq!(forecast.hourly.len(), 48);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("heavy RAIN"), "Heavy rain");
        assert_eq!(capitalize("clear sky"), "Clear sky");
        assert_eq!(capitalize(""), "");
    }
}

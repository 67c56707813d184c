//! Weatherbot - chat-facing weather relay
//!
//! This library provides the core functionality behind a weather chat bot:
//! scraping a public weather bulletin page into a structured report and
//! turning a geographic location into a formatted hourly forecast with
//! derived warnings.

pub mod bot;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod report;

// Re-export core types for public API
pub use config::WeatherBotConfig;
pub use error::WeatherBotError;
pub use forecast::{ForecastClient, render_forecast};
pub use models::{Alert, Forecast, HourlyPoint, Location, Report, Section};
pub use report::{ReportScraper, extract_report};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherBotError>;

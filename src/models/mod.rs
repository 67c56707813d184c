//! Data models for scraped reports and forecast payloads

pub mod forecast;
pub mod report;

pub use forecast::{Alert, Forecast, HourlyPoint, Location};
pub use report::{Report, Section};

//! Message assembly for the chat dispatch layer
//!
//! Maps the two inbound triggers to the outbound message payloads the
//! messaging layer sends, plus the fixed replies for everything else. No
//! chat SDK types appear here; the dispatch layer owns delivery.

use crate::forecast::ForecastClient;
use crate::report::ReportScraper;

/// Reply to the start command
pub const GREETING: &str = "I'm a bot, please talk to me!";
/// Reply to unrecognized text messages
pub const USAGE_HINT: &str = "Try using the /weather command.";
/// Reply when a forecast is requested without a shared location
pub const LOCATION_PROMPT: &str = "Please send your location to get the forecast.";
/// Confirmation sent before the report sections
pub const REPORT_FETCHED: &str = "Weather report fetched successfully!";
/// Generic reply when the report scrape fails; the cause goes to the log only
pub const REPORT_FAILURE: &str = "Failed to fetch weather report.";

/// Assemble the outbound messages for the report trigger.
///
/// On success: the confirmation, the bulletin title, then one message per
/// section. On failure the underlying error is logged and the caller gets
/// only the generic failure message.
pub fn report_messages(scraper: &ReportScraper) -> Vec<String> {
    match scraper.fetch_report() {
        Ok(report) => {
            let mut messages = Vec::with_capacity(report.sections.len() + 2);
            messages.push(REPORT_FETCHED.to_string());
            messages.push(report.title);
            for section in report.sections {
                messages.push(format!("**{}**\n{}", section.name, section.content));
            }
            messages
        }
        Err(e) => {
            tracing::error!("Error fetching weather report: {e}");
            vec![REPORT_FAILURE.to_string()]
        }
    }
}

/// Assemble the outbound message for the forecast trigger.
pub fn forecast_message(client: &ForecastClient, latitude: f64, longitude: f64) -> String {
    tracing::info!("Received location: {latitude}, {longitude}");
    client.get_forecast_text(latitude, longitude)
}

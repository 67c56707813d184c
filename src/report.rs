//! Weather bulletin scraping
//!
//! Fetches the configured report page, extracts the titled bulletin into a
//! [`Report`], and keeps an idempotent JSON snapshot of the last successful
//! scrape on disk.

use crate::Result;
use crate::config::ReportConfig;
use crate::error::WeatherBotError;
use crate::models::{Report, Section};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Phrase identifying the bulletin heading on the report page
const TITLE_MARKER: &str = "Weather report issued";
/// Tag carrying the bulletin title
const TITLE_TAG: &str = "h4";
/// Tag starting a new subsection
const SECTION_TAG: &str = "h5";
/// Tag carrying a subsection's text block
const CONTENT_TAG: &str = "div";

/// Client for the weather bulletin page
pub struct ReportScraper {
    client: Client,
    config: ReportConfig,
}

impl ReportScraper {
    /// Create a new scraper from report configuration
    pub fn new(config: ReportConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("weatherbot/0.1.0")
            .build()
            .map_err(|e| WeatherBotError::general(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Fetch the report page and extract the bulletin.
    ///
    /// Fails with the `Fetch` kind on request errors, timeouts, and non-2xx
    /// responses; the timeout is a hard cutoff, never retried. A page without
    /// the marker heading is not an error: the returned report simply has an
    /// empty title and no sections. As a side effect the report snapshot is
    /// written if its serialization changed.
    #[instrument(skip(self))]
    pub fn fetch_report(&self) -> Result<Report> {
        let url = self.config.source_url.as_deref().ok_or_else(|| {
            WeatherBotError::config(
                "Missing report source URL. Set REPORT_SOURCE_URL in the environment.",
            )
        })?;

        info!("Fetching weather report page");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| WeatherBotError::fetch(format!("Request to report page failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherBotError::fetch(format!(
                "Report page returned HTTP {status}"
            )));
        }

        let html = response
            .text()
            .map_err(|e| WeatherBotError::fetch(format!("Failed to read report page body: {e}")))?;

        let report = extract_report(&html, url);
        if report.has_title() {
            info!(sections = report.sections.len(), "Extracted weather report");
        } else {
            warn!("No bulletin marker heading found on report page");
        }

        write_snapshot(&report, &self.config.snapshot_path)?;

        Ok(report)
    }
}

/// States of the extraction walk over the document-order element stream
enum WalkState {
    /// Scanning for the marker heading
    SeekTitle,
    /// Collecting subsection headings and content blocks
    InSection,
    /// Hit an unrecognized element; collection is over
    Done,
}

/// Extract the bulletin structure from raw HTML.
///
/// The walk visits elements in document order. The first `h4` whose text
/// contains the marker phrase becomes the title; from there, each `h5` opens
/// a section and each `div` supplies the open section's content if it has
/// none yet. The first element of any other kind ends the walk. This stop
/// condition defines where the bulletin ends on the page, so a layout change
/// truncates the extraction silently instead of erroring.
#[must_use]
pub fn extract_report(html: &str, source: &str) -> Report {
    let document = Html::parse_document(html);
    let mut report = Report::new(source);

    let mut state = WalkState::SeekTitle;
    let mut marker_id = None;

    for element in document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
    {
        match state {
            WalkState::SeekTitle => {
                if element.value().name() == TITLE_TAG {
                    let text = element_text(element);
                    if text.contains(TITLE_MARKER) {
                        report.title = text;
                        marker_id = Some(element.id());
                        state = WalkState::InSection;
                    }
                }
            }
            WalkState::InSection => {
                // The marker heading's own subtree is not part of the walk
                if let Some(id) = marker_id {
                    if element.ancestors().any(|a| a.id() == id) {
                        continue;
                    }
                }

                match element.value().name() {
                    SECTION_TAG => {
                        report.sections.push(Section {
                            name: element_text(element),
                            content: String::new(),
                        });
                    }
                    CONTENT_TAG => {
                        // Only the first non-empty block counts; content
                        // before any section heading is discarded
                        if let Some(section) = report.sections.last_mut() {
                            if section.content.is_empty() {
                                let text = element_text(element);
                                if !text.is_empty() {
                                    section.content = text;
                                }
                            }
                        }
                    }
                    _ => {
                        state = WalkState::Done;
                    }
                }
            }
            WalkState::Done => {}
        }

        if matches!(state, WalkState::Done) {
            break;
        }
    }

    report
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Write the report snapshot, skipping the write when the serialized content
/// is byte-identical to what is already on disk.
pub fn write_snapshot(report: &Report, path: &Path) -> Result<()> {
    let new_json = report
        .to_snapshot_json()
        .map_err(|e| WeatherBotError::general(format!("Failed to serialize report: {e}")))?;

    let unchanged = match fs::read_to_string(path) {
        Ok(existing) => existing == new_json,
        Err(_) => false,
    };

    if unchanged {
        debug!(path = %path.display(), "Report snapshot unchanged, skipping write");
        return Ok(());
    }

    fs::write(path, &new_json)?;
    info!(path = %path.display(), "Wrote report snapshot");
    Ok(())
}

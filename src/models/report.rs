//! Structured extraction of a weather bulletin page

use serde::{Deserialize, Serialize};

/// A scraped weather bulletin: title plus ordered subsections.
///
/// Serialized form is the snapshot format: keys `title`, `source`, `report`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Report {
    /// Title text of the bulletin heading (empty when no marker heading was found)
    pub title: String,
    /// URL the bulletin was scraped from
    pub source: String,
    /// Subsections in document order
    #[serde(rename = "report")]
    pub sections: Vec<Section>,
}

/// One titled subsection of a bulletin
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Section {
    /// Subsection heading text
    #[serde(rename = "section")]
    pub name: String,
    /// First non-empty text block following the heading; later blocks are ignored
    pub content: String,
}

impl Report {
    /// Create an empty report for a source URL
    #[must_use]
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            title: String::new(),
            source: source.into(),
            sections: Vec::new(),
        }
    }

    /// Whether the marker heading was found on the page
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }

    /// Canonical pretty-printed JSON used for the on-disk snapshot.
    ///
    /// The snapshot is compared byte-for-byte before writing, so this
    /// serialization must stay deterministic: field order follows the struct,
    /// indentation is two spaces, non-ASCII text is kept as UTF-8.
    pub fn to_snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

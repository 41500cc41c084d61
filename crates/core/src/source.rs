//! Source — a candidate web page discovered for a tutoring topic.
//!
//! Created by the search client with no content, populated exactly once by
//! the extraction stage, read-only everywhere downstream.

use serde::{Deserialize, Serialize};

/// Fixed marker substituted for content that could not be obtained.
///
/// Distinguishable from real content; the prompt assembler embeds it
/// verbatim so the model learns a source is degraded from the text itself.
pub const UNAVAILABLE: &str = "not available";

/// A web page returned by the search backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Page title as reported by the search provider
    pub name: String,

    /// Page URL
    pub url: String,

    /// Extracted readable text. `None` until the extraction stage has run;
    /// afterwards either real text or [`UNAVAILABLE`].
    #[serde(
        rename = "fullContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_content: Option<String>,
}

impl Source {
    /// Create a source fresh from a search result, with no content yet.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            full_content: None,
        }
    }

    /// Whether extraction resolved this source to the unavailable sentinel.
    pub fn is_unavailable(&self) -> bool {
        self.full_content.as_deref() == Some(UNAVAILABLE)
    }
}

//! Parallel fetch-and-extract of readable text from candidate sources.
//!
//! One task per source, each bounded by its own hard deadline. A slow or
//! failing source resolves to the unavailable sentinel without delaying or
//! cancelling its siblings; the batch completes only when every task has
//! resolved, preserving input order and cardinality exactly.

pub mod clean;
pub mod readability;

use std::time::Duration;

use tracing::{debug, warn};
use tutorforge_core::error::ExtractError;
use tutorforge_core::source::{Source, UNAVAILABLE};

pub use clean::{MAX_CONTENT_LEN, clean_text};
pub use readability::extract_readable;

/// Default per-source fetch deadline.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(3000);

/// Fetches every source in parallel and populates `full_content`.
#[derive(Clone)]
pub struct ExtractionStage {
    client: reqwest::Client,
    fetch_timeout: Duration,
    max_len: usize,
}

impl ExtractionStage {
    pub fn new(fetch_timeout: Duration, max_len: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            fetch_timeout,
            max_len,
        }
    }

    /// Build from application configuration.
    pub fn from_config(config: &tutorforge_config::AppConfig) -> Self {
        Self::new(
            Duration::from_millis(config.extraction.fetch_timeout_ms),
            config.extraction.max_content_len,
        )
    }

    /// Extract readable text for every source.
    ///
    /// The result has exactly the same length and order as the input, and
    /// every element has `full_content` populated — real text on success,
    /// the [`UNAVAILABLE`] sentinel on timeout, network failure, or parse
    /// failure. Sibling tasks are never cancelled by one another; the
    /// barrier waits for all of them regardless of individual outcome.
    pub async fn extract_all(&self, sources: Vec<Source>) -> Vec<Source> {
        let handles: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let stage = self.clone();
                let fallback = Source {
                    full_content: Some(UNAVAILABLE.to_string()),
                    ..source.clone()
                };
                let handle = tokio::spawn(async move { stage.extract_one(source).await });
                (handle, fallback)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (handle, fallback) in handles {
            match handle.await {
                Ok(source) => results.push(source),
                // A panicked task still yields its slot, as the sentinel.
                Err(e) => {
                    warn!(url = %fallback.url, error = %e, "Extraction task aborted");
                    results.push(fallback);
                }
            }
        }
        results
    }

    /// Resolve a single source, converting any failure to the sentinel.
    async fn extract_one(&self, mut source: Source) -> Source {
        match self.fetch_and_parse(&source.url).await {
            Ok(text) => {
                debug!(url = %source.url, chars = text.len(), "Source extracted");
                source.full_content = Some(text);
            }
            Err(e) => {
                warn!(url = %source.url, error = %e, "Source extraction failed");
                source.full_content = Some(UNAVAILABLE.to_string());
            }
        }
        source
    }

    async fn fetch_and_parse(&self, url: &str) -> Result<String, ExtractError> {
        let fetch = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ExtractError::NetworkFailure(format!("{url}: {e}")))?;
            response
                .text()
                .await
                .map_err(|e| ExtractError::NetworkFailure(format!("{url}: {e}")))
        };

        let html = tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .map_err(|_| ExtractError::Timeout(url.to_string()))??;

        let readable = extract_readable(&html)
            .ok_or_else(|| ExtractError::MalformedResponse(format!("{url}: no readable text")))?;

        Ok(clean_text(&readable, self.max_len))
    }
}

impl Default for ExtractionStage {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT, MAX_CONTENT_LEN)
    }
}

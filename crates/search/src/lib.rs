//! Source discovery for tutoring sessions.
//!
//! A [`SearchClient`] rewrites the learner's topic query into an explanatory
//! frame and dispatches it to one of two capability-equivalent backends
//! (Serper or Bing), selected by configuration at construction time. Both
//! normalize their provider-specific payloads to the same [`Source`] shape.
//!
//! Failures here are never fatal to a session: the caller treats a
//! [`SearchError`] as "no sources" and surfaces that state to the user.

pub mod bing;
pub mod serper;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use tutorforge_core::error::SearchError;
use tutorforge_core::source::Source;

pub use bing::BingBackend;
pub use serper::SerperBackend;

/// A search provider capable of returning candidate sources for a query.
///
/// Implementations must normalize to [`Source`] with empty `full_content`
/// regardless of their own response schema.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "serper", "bing").
    fn name(&self) -> &str;

    /// Run the (already rewritten) query and return candidate sources.
    async fn search(&self, query: &str) -> Result<Vec<Source>, SearchError>;
}

/// Discovers authoritative pages for a learner's topic query.
pub struct SearchClient {
    backend: Arc<dyn SearchBackend>,
}

impl SearchClient {
    /// Create a client over an explicitly chosen backend.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// The active backend's name.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Search for sources teaching the given topic.
    ///
    /// The raw topic is rewritten with an explanatory frame before dispatch
    /// so providers return definition-style pages rather than news. Returned
    /// sources have no content yet; the extraction stage populates them.
    pub async fn search(&self, query: &str) -> Result<Vec<Source>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::NotConfigured("empty query".into()));
        }

        let framed = format!("what is {query}");
        debug!(backend = %self.backend.name(), query = %framed, "Dispatching search");

        let sources = self.backend.search(&framed).await?;
        info!(
            backend = %self.backend.name(),
            count = sources.len(),
            "Search returned candidate sources"
        );
        Ok(sources)
    }
}

/// Build the configured search client.
///
/// Backend selection is explicit construction-time configuration — there is
/// no module-level flag to flip at runtime.
pub fn build_from_config(
    config: &tutorforge_config::AppConfig,
) -> Result<SearchClient, SearchError> {
    let backend: Arc<dyn SearchBackend> = match config.search.provider.as_str() {
        "serper" => {
            let key = config.search.serper_api_key.clone().ok_or_else(|| {
                SearchError::NotConfigured("SERPER_API_KEY is required".into())
            })?;
            Arc::new(SerperBackend::new(key))
        }
        "bing" => {
            let key = config.search.bing_api_key.clone().ok_or_else(|| {
                SearchError::NotConfigured("BING_API_KEY is required".into())
            })?;
            Arc::new(BingBackend::new(key).with_excluded_sites(config.search.excluded_sites.clone()))
        }
        other => {
            return Err(SearchError::NotConfigured(format!(
                "unknown search provider '{other}'"
            )));
        }
    };

    Ok(SearchClient::new(backend))
}

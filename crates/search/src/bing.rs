//! Bing backend — results via the Bing Web Search v7 API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use tutorforge_core::error::SearchError;
use tutorforge_core::source::Source;

use crate::SearchBackend;

const BING_URL: &str = "https://api.bing.microsoft.com/v7.0/search";

/// Number of results requested per query.
const RESULT_COUNT: u32 = 6;

pub struct BingBackend {
    api_key: String,
    base_url: String,
    excluded_sites: Vec<String>,
    client: reqwest::Client,
}

impl BingBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BING_URL.to_string(),
            excluded_sites: Vec::new(),
            client: reqwest::Client::new(),
        }
    }

    /// Sites to exclude from results via `-site:` operators.
    pub fn with_excluded_sites(mut self, sites: Vec<String>) -> Self {
        self.excluded_sites = sites;
        self
    }

    /// Point at a different endpoint (used by tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_query(&self, query: &str) -> String {
        let exclusions: Vec<String> = self
            .excluded_sites
            .iter()
            .map(|site| format!("-site:{site}"))
            .collect();
        if exclusions.is_empty() {
            query.to_string()
        } else {
            format!("{query} {}", exclusions.join(" "))
        }
    }
}

#[async_trait]
impl SearchBackend for BingBackend {
    fn name(&self) -> &str {
        "bing"
    }

    async fn search(&self, query: &str) -> Result<Vec<Source>, SearchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", self.build_query(query)),
                ("mkt", "en-US".to_string()),
                ("count", RESULT_COUNT.to_string()),
                ("safeSearch", "Strict".to_string()),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Bing returned error");
            return Err(SearchError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let payload: BingResponse = response
            .json()
            .await
            .map_err(|e| SearchError::MalformedResponse(e.to_string()))?;

        Ok(payload
            .web_pages
            .value
            .into_iter()
            .map(|r| Source::new(r.name, r.url))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages")]
    web_pages: BingWebPages,
}

#[derive(Debug, Deserialize)]
struct BingWebPages {
    value: Vec<BingResult>,
}

#[derive(Debug, Deserialize)]
struct BingResult {
    name: String,
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bing_payload() {
        let data = r#"{
            "webPages": {
                "value": [
                    {"name": "Photosynthesis", "url": "https://en.wikipedia.org/wiki/Photosynthesis", "snippet": "..."},
                    {"name": "Photosynthesis basics", "url": "https://www.britannica.com/science/photosynthesis"}
                ]
            },
            "rankingResponse": {}
        }"#;
        let parsed: BingResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.web_pages.value.len(), 2);
        assert_eq!(parsed.web_pages.value[0].name, "Photosynthesis");
    }

    #[test]
    fn missing_web_pages_is_schema_failure() {
        let data = r#"{"rankingResponse": {}}"#;
        assert!(serde_json::from_str::<BingResponse>(data).is_err());
    }

    #[test]
    fn excluded_sites_become_negative_operators() {
        let backend = BingBackend::new("key")
            .with_excluded_sites(vec!["youtube.com".into(), "pinterest.com".into()]);
        let q = backend.build_query("what is basketball");
        assert_eq!(q, "what is basketball -site:youtube.com -site:pinterest.com");
    }

    #[test]
    fn no_exclusions_leaves_query_untouched() {
        let backend = BingBackend::new("key");
        assert_eq!(backend.build_query("what is jazz"), "what is jazz");
    }

    #[tokio::test]
    async fn search_normalizes_results() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let body = r#"{"webPages": {"value": [{"name": "Jazz", "url": "https://en.wikipedia.org/wiki/Jazz"}]}}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        let backend = BingBackend::new("test-key").with_base_url(format!("http://{addr}/v7.0/search"));
        let sources = backend.search("what is jazz").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://en.wikipedia.org/wiki/Jazz");
    }
}

//! Serper backend — Google results via the serper.dev API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use tutorforge_core::error::SearchError;
use tutorforge_core::source::Source;

use crate::SearchBackend;

const SERPER_URL: &str = "https://google.serper.dev/search";

/// Number of organic results requested per query.
const RESULT_COUNT: u32 = 9;

pub struct SerperBackend {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl SerperBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: SERPER_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point at a different endpoint (used by tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl SearchBackend for SerperBackend {
    fn name(&self) -> &str {
        "serper"
    }

    async fn search(&self, query: &str) -> Result<Vec<Source>, SearchError> {
        let body = serde_json::json!({
            "q": query,
            "num": RESULT_COUNT,
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Serper returned error");
            return Err(SearchError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        // Typed deserialization doubles as schema validation: a payload
        // missing `organic` or its fields is a malformed response.
        let payload: SerperResponse = response
            .json()
            .await
            .map_err(|e| SearchError::MalformedResponse(e.to_string()))?;

        Ok(payload
            .organic
            .into_iter()
            .map(|r| Source::new(r.title, r.link))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    title: String,
    link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serper_payload() {
        let data = r#"{
            "organic": [
                {"title": "Photosynthesis - Wikipedia", "link": "https://en.wikipedia.org/wiki/Photosynthesis", "position": 1},
                {"title": "What is photosynthesis?", "link": "https://www.snexplores.org/article/explainer-how-photosynthesis-works", "position": 2}
            ],
            "searchParameters": {"q": "what is photosynthesis"}
        }"#;
        let parsed: SerperResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[0].title, "Photosynthesis - Wikipedia");
        assert!(parsed.organic[1].link.starts_with("https://"));
    }

    #[test]
    fn missing_organic_is_schema_failure() {
        let data = r#"{"searchParameters": {"q": "x"}}"#;
        assert!(serde_json::from_str::<SerperResponse>(data).is_err());
    }

    #[test]
    fn result_missing_link_is_schema_failure() {
        let data = r#"{"organic": [{"title": "no link here"}]}"#;
        assert!(serde_json::from_str::<SerperResponse>(data).is_err());
    }

    /// Serve one canned HTTP response on a local port, then stop.
    async fn serve_json(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}/search")
    }

    #[tokio::test]
    async fn search_normalizes_results() {
        let url = serve_json(
            "HTTP/1.1 200 OK",
            r#"{"organic": [{"title": "Oak - Wikipedia", "link": "https://en.wikipedia.org/wiki/Oak"}]}"#,
        )
        .await;
        let backend = SerperBackend::new("test-key").with_base_url(url);

        let sources = backend.search("what is an oak").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Oak - Wikipedia");
        assert!(sources[0].full_content.is_none());
    }

    #[tokio::test]
    async fn non_200_is_api_error_with_status() {
        let url = serve_json("HTTP/1.1 403 Forbidden", r#"{"message": "bad key"}"#).await;
        let backend = SerperBackend::new("wrong-key").with_base_url(url);

        let err = backend.search("anything").await.unwrap_err();
        match err {
            SearchError::ApiError { status_code, .. } => assert_eq!(status_code, 403),
            other => panic!("unexpected error: {other}"),
        }
    }
}

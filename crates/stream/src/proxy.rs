//! Completion stream proxy — the protocol translation state machine.
//!
//! Opens an upstream OpenAI-compatible chat-completions request and turns
//! its raw SSE byte stream into an ordered sequence of normalized
//! [`DeltaFrame`]s: `OPENING → STREAMING → DONE`, or `→ FAILED` from either
//! state. The pipeline is an explicit two-stage channel: a producer task
//! reframes bytes into event payloads, a forwarder task parses payloads,
//! filters leading noise, and emits surviving deltas. Both channels are
//! bounded, so a slow downstream applies backpressure all the way to the
//! upstream read; dropping the output receiver cancels the upstream request.

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tutorforge_core::error::CompletionError;
use tutorforge_core::message::Message;

use crate::sse::{SseFramer, sse_frame};

/// Terminal sentinel emitted by the upstream when generation completes.
const DONE_SENTINEL: &str = "[DONE]";

/// Channel depth for both pipeline stages.
const CHANNEL_CAPACITY: usize = 64;

/// How many newline-only deltas are absorbed before real content starts.
const LEADING_NOISE_BUDGET: u32 = 2;

/// An OpenAI-compatible completion endpoint.
///
/// Works with Together AI, OpenAI, and anything else exposing a
/// `/chat/completions` route with SSE streaming.
pub struct CompletionClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl CompletionClient {
    /// Create a new completion client.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create a Together AI client (convenience constructor).
    pub fn together(api_key: impl Into<String>) -> Self {
        Self::new("together", "https://api.together.xyz/v1", api_key)
    }

    /// Create an OpenAI client (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Build the configured completion client.
    pub fn from_config(config: &tutorforge_config::AppConfig) -> Self {
        let name = config.completion.provider.clone();
        let base_url = config
            .completion
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(&name));
        let api_key = config.api_key.clone().unwrap_or_default();
        Self::new(name, base_url, api_key)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Get the default base URL for well-known completion providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "together" => "https://api.together.xyz/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

/// Generation parameters for one tutoring turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Assemble a request from config defaults and a message sequence.
    pub fn from_config(config: &tutorforge_config::AppConfig, messages: Vec<Message>) -> Self {
        Self {
            model: config.completion.model.clone(),
            messages,
            temperature: config.completion.temperature,
            max_tokens: config.completion.max_tokens,
        }
    }
}

/// One normalized output event: a single forwarded text delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaFrame {
    pub text: String,
}

impl DeltaFrame {
    /// Render as a normalized SSE frame (`data: {"text": ...}\n\n`).
    pub fn to_sse(&self) -> String {
        sse_frame(&serde_json::to_string(self).unwrap_or_default())
    }
}

/// Drops the upstream's leading blank-line artifact.
///
/// The first [`LEADING_NOISE_BUDGET`] deltas consisting solely of newline
/// characters are dropped; the count that governs this is forwarded deltas,
/// not payload position. A delta mixing newlines with other text is always
/// forwarded (and counted), even as the very first delta.
#[derive(Debug, Default)]
struct DeltaFilter {
    forwarded: u32,
}

impl DeltaFilter {
    /// Decide whether to forward this delta, updating the counter if so.
    fn admit(&mut self, text: &str) -> bool {
        if self.forwarded < LEADING_NOISE_BUDGET
            && !text.is_empty()
            && text.chars().all(|c| c == '\n')
        {
            return false;
        }
        self.forwarded += 1;
        true
    }
}

/// Extract the incremental text from one upstream delta payload.
fn parse_delta(payload: &str) -> Result<String, CompletionError> {
    let response: StreamResponse = serde_json::from_str(payload)
        .map_err(|e| CompletionError::FrameParse(format!("{e}: {payload}")))?;
    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default())
}

/// Proxies one upstream completion stream into normalized delta frames.
pub struct StreamProxy {
    client: CompletionClient,
}

impl StreamProxy {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Open the upstream request and start translating.
    ///
    /// - A transport failure opening the request is returned as
    ///   `CompletionError::Network`.
    /// - A non-success upstream status is captured for diagnostics and the
    ///   returned stream terminates immediately with no events — nothing is
    ///   thrown past this boundary.
    /// - Once streaming, a malformed frame or interrupted body arrives as
    ///   the final `Err` item before the stream closes.
    ///
    /// Dropping the receiver aborts the upstream request promptly.
    pub async fn open(
        &self,
        request: CompletionRequest,
    ) -> Result<mpsc::Receiver<Result<DeltaFrame, CompletionError>>, CompletionError> {
        let url = format!("{}/chat/completions", self.client.base_url);

        let body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": true,
        });

        debug!(provider = %self.client.name, model = %request.model, "Opening completion stream");

        let response = self
            .client
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.client.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let refusal = CompletionError::ApiError {
                status_code: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body: response.text().await.unwrap_or_default(),
            };
            warn!(error = %refusal, "Completion endpoint refused the stream");
            // Graceful termination: the caller observes a stream that closes
            // without ever producing an event.
            let (_tx, rx) = mpsc::channel(1);
            return Ok(rx);
        }

        let (payload_tx, payload_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (delta_tx, delta_rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(pump_payloads(response.bytes_stream(), payload_tx));
        tokio::spawn(forward_deltas(payload_rx, delta_tx));

        Ok(delta_rx)
    }
}

/// Producer stage: raw bytes in, complete event payloads out.
///
/// The only suspension points are the upstream read and the bounded channel
/// send; when the consumer stops receiving, this stage stops reading.
async fn pump_payloads<S, B, E>(
    mut byte_stream: S,
    tx: mpsc::Sender<Result<String, CompletionError>>,
) where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut framer = SseFramer::new();

    while let Some(chunk) = byte_stream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx
                    .send(Err(CompletionError::StreamInterrupted(e.to_string())))
                    .await;
                return;
            }
        };

        for payload in framer.feed(bytes.as_ref()) {
            if tx.send(Ok(payload)).await.is_err() {
                return; // consumer gone — stop reading upstream
            }
        }
    }
}

/// Forwarder stage: event payloads in, filtered delta frames out.
async fn forward_deltas(
    mut rx: mpsc::Receiver<Result<String, CompletionError>>,
    tx: mpsc::Sender<Result<DeltaFrame, CompletionError>>,
) {
    let mut filter = DeltaFilter::default();

    while let Some(payload) = rx.recv().await {
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        if payload == DONE_SENTINEL {
            return; // DONE: close the output stream
        }

        match parse_delta(&payload) {
            Ok(text) => {
                if !filter.admit(&text) {
                    continue;
                }
                if tx.send(Ok(DeltaFrame { text })).await.is_err() {
                    return; // receiver dropped
                }
            }
            Err(e) => {
                // FAILED: propagate on the error channel, stop translating.
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }
}

// --- Upstream SSE delta types ---

/// A single `data: {...}` chunk of a streaming completion response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

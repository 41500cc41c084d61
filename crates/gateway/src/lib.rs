//! HTTP API gateway for TutorForge.
//!
//! Exposes the tutoring pipeline over REST:
//!
//! - `GET  /health`              — Liveness check
//! - `POST /api/sources`         — Discover candidate sources for a topic
//! - `POST /api/sources/extract` — Fetch and extract readable text in parallel
//! - `POST /api/chat`            — Open a tutoring reply as an SSE stream
//!
//! Built on Axum for high performance async HTTP.

pub mod admission;

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::response::sse::{Event as SseEvent, Sse};
use axum::response::{IntoResponse, Response};
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use tutorforge_core::admission::AdmissionGate;
use tutorforge_core::message::Message;
use tutorforge_core::source::Source;
use tutorforge_extract::ExtractionStage;
use tutorforge_search::SearchClient;
use tutorforge_stream::{CompletionClient, CompletionRequest, StreamProxy};

/// Literal body returned when a caller's request budget is exhausted.
const BUDGET_EXHAUSTED_BODY: &str = "No requests left. Try again in 24h.";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: tutorforge_config::AppConfig,
    /// Absent when no search API key is configured.
    pub search: Option<SearchClient>,
    pub extraction: ExtractionStage,
    pub proxy: StreamProxy,
    pub admission: Arc<dyn AdmissionGate>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS allowing browser clients to call the API directly
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/sources", post(sources_handler))
        .route("/api/sources/extract", post(extract_handler))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: tutorforge_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let search = match tutorforge_search::build_from_config(&config) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "Search backend unavailable, /api/sources will fail");
            None
        }
    };

    let state = Arc::new(GatewayState {
        search,
        extraction: ExtractionStage::from_config(&config),
        proxy: StreamProxy::new(CompletionClient::from_config(&config)),
        admission: admission::build_from_config(&config),
        start_time: chrono::Utc::now(),
        config,
    });

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Request / Response types ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
}

#[derive(Deserialize)]
struct SourcesRequest {
    question: String,
}

#[derive(Deserialize)]
struct ExtractRequest {
    sources: Vec<Source>,
}

#[derive(Deserialize)]
struct ChatRequest {
    messages: Vec<Message>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_gateway(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// --- Handlers ---

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
    })
}

/// `POST /api/sources` — discover candidate sources for a topic.
async fn sources_handler(
    State(state): State<SharedState>,
    Json(payload): Json<SourcesRequest>,
) -> Result<Json<Vec<Source>>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = uuid::Uuid::new_v4();
    info!(%request_id, question = %payload.question, "Source discovery request");

    let client = state
        .search
        .as_ref()
        .ok_or_else(|| bad_gateway("search backend not configured"))?;

    match client.search(&payload.question).await {
        Ok(sources) => Ok(Json(sources)),
        Err(e) => {
            warn!(%request_id, error = %e, "Source discovery failed");
            Err(bad_gateway("could not fetch sources"))
        }
    }
}

/// `POST /api/sources/extract` — fetch and extract every source in parallel.
///
/// Always succeeds once the body parses: individual fetch failures resolve
/// to the unavailable sentinel rather than failing the batch.
async fn extract_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ExtractRequest>,
) -> Json<Vec<Source>> {
    let request_id = uuid::Uuid::new_v4();
    info!(%request_id, count = payload.sources.len(), "Extraction request");

    Json(state.extraction.extract_all(payload.sources).await)
}

/// `POST /api/chat` — open a tutoring reply as a normalized SSE stream.
///
/// The admission gate runs before anything is spent on the request. A denied
/// caller gets 429 with a plain-text body; an upstream that cannot be
/// reached gets 502; an upstream that refuses the stream gets a 200 SSE
/// response that terminates without events.
async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let identity = admission::client_identity(&headers);

    let decision = state.admission.check(&identity);
    if !decision.allowed {
        warn!(%request_id, identity = %identity, "Request budget exhausted");
        return (StatusCode::TOO_MANY_REQUESTS, BUDGET_EXHAUSTED_BODY).into_response();
    }

    if payload.messages.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "messages must not be empty".into(),
            }),
        )
            .into_response();
    }

    info!(%request_id, identity = %identity, turns = payload.messages.len(), "Chat stream request");

    let request = CompletionRequest::from_config(&state.config, payload.messages);
    let rx = match state.proxy.open(request).await {
        Ok(rx) => rx,
        Err(e) => {
            error!(%request_id, error = %e, "Failed to open completion stream");
            return bad_gateway("generation failed").into_response();
        }
    };

    let stream = ReceiverStream::new(rx).map(move |item| -> Result<SseEvent, Infallible> {
        match item {
            Ok(frame) => Ok(SseEvent::default()
                .data(serde_json::to_string(&frame).unwrap_or_default())),
            Err(e) => {
                // The channel closes right after an error item, so this is
                // the stream's final event.
                warn!(%request_id, error = %e, "Completion stream ended with error");
                Ok(SseEvent::default().event("error").data(e.to_string()))
            }
        }
    });

    (
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(stream),
    )
        .into_response()
}

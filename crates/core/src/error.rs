//! Error types for the TutorForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each pipeline stage has its own error enum so callers can apply the
//! correct isolation policy: extraction failures are recovered per-source,
//! streaming failures are terminal for that stream only, search failures
//! degrade the session to an empty source list. There is deliberately no
//! umbrella error type: no caller handles more than one stage.

use thiserror::Error;

/// Failures talking to a search provider. The session continues without
/// sources when one of these occurs — no retries at this layer.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Search provider returned a malformed payload: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Search backend not configured: {0}")]
    NotConfigured(String),
}

/// Per-source extraction failures. Always isolated: each converts the
/// affected source to the unavailable sentinel and never escalates to the
/// batch. The three variants are distinct so the deadline, transport, and
/// parse outcomes never collapse into one another.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("Fetch deadline expired for {0}")]
    Timeout(String),

    #[error("Network failure fetching {0}")]
    NetworkFailure(String),

    #[error("Unable to parse fetched document: {0}")]
    MalformedResponse(String),
}

/// Failures on the completion streaming path. Terminal for the affected
/// stream; surfaced as a clean stream termination plus an out-of-band
/// error, never a crash of the hosting process.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("Completion API returned {status_code} {status_text}: {body}")]
    ApiError {
        status_code: u16,
        status_text: String,
        body: String,
    },

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Malformed event payload: {0}")]
    FrameParse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_error_displays_status() {
        let err = SearchError::ApiError {
            status_code: 503,
            message: "upstream busy".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("upstream busy"));
    }

    #[test]
    fn extract_variants_are_distinct() {
        let timeout = ExtractError::Timeout("https://slow.example".into());
        let network = ExtractError::NetworkFailure("https://down.example".into());
        assert!(timeout.to_string().contains("deadline"));
        assert!(network.to_string().contains("Network failure"));
    }

    #[test]
    fn completion_api_error_carries_diagnostics() {
        let err = CompletionError::ApiError {
            status_code: 401,
            status_text: "Unauthorized".into(),
            body: "bad key".into(),
        };
        let text = err.to_string();
        assert!(text.contains("401"));
        assert!(text.contains("Unauthorized"));
        assert!(text.contains("bad key"));
    }
}

//! Client-side consumption of the normalized delta stream.
//!
//! The consumer is the read half of the protocol: it reframes the
//! normalized SSE bytes, decodes each `{"text": ...}` frame, and folds the
//! deltas into the trailing assistant message of a conversation. It never
//! assumes any alignment between network chunks and frames.

use futures::{Stream, StreamExt};
use tracing::warn;
use tutorforge_core::message::Conversation;

use crate::proxy::DeltaFrame;
use crate::sse::SseFramer;

/// Incremental reader of a normalized completion stream.
///
/// Feed it bytes as they arrive; every completed frame is folded into the
/// conversation immediately, so the caller can render the partial reply
/// after each call. A frame that fails to decode is logged and skipped
/// rather than aborting the fold.
#[derive(Debug, Default)]
pub struct StreamConsumer {
    framer: SseFramer,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one raw chunk into the conversation.
    ///
    /// Returns the deltas applied by this chunk, in arrival order, for
    /// callers that render incrementally.
    pub fn feed(&mut self, chunk: &[u8], conversation: &mut Conversation) -> Vec<String> {
        let mut applied = Vec::new();
        for payload in self.framer.feed(chunk) {
            match serde_json::from_str::<DeltaFrame>(&payload) {
                Ok(frame) => {
                    conversation.apply_delta(&frame.text);
                    applied.push(frame.text);
                }
                Err(e) => {
                    warn!(error = %e, payload = %payload, "Skipping undecodable frame");
                }
            }
        }
        applied
    }

    /// Drain an entire byte stream into the conversation.
    ///
    /// The stream ends at EOF; a transport error ends the fold early with
    /// whatever text arrived intact. Returns the full appended text.
    pub async fn consume<S, B, E>(
        &mut self,
        mut byte_stream: S,
        conversation: &mut Conversation,
    ) -> Result<String, E>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
    {
        let mut appended = String::new();
        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk?;
            for delta in self.feed(chunk.as_ref(), conversation) {
                appended.push_str(&delta);
            }
        }
        Ok(appended)
    }
}

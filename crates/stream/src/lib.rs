//! Streaming protocol translation for TutorForge.
//!
//! The proxy side ([`StreamProxy`]) opens an upstream chat-completions
//! request, reframes the raw SSE byte stream into discrete JSON deltas,
//! filters leading noise, and re-emits a normalized SSE stream of
//! `{"text": ...}` frames. The consumer side ([`StreamConsumer`]) decodes
//! that normalized stream incrementally and folds each delta into a growing
//! assistant message.
//!
//! Both directions share the same reframing discipline ([`SseFramer`]):
//! JSON parsing is never attempted on a partial event, no matter how the
//! transport slices the bytes.

pub mod consumer;
pub mod proxy;
pub mod sse;

pub use consumer::StreamConsumer;
pub use proxy::{CompletionClient, CompletionRequest, DeltaFrame, StreamProxy};
pub use sse::{SseFramer, sse_frame};

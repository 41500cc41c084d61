//! # TutorForge Core
//!
//! Domain types, traits, and error definitions for the TutorForge tutoring
//! pipeline. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The pipeline stages (search, extraction, streaming) are defined against
//! the types and traits here. Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod admission;
pub mod error;
pub mod message;
pub mod prompt;
pub mod source;

// Re-export key types at crate root for ergonomics
pub use admission::{AdmissionDecision, AdmissionGate};
pub use error::{CompletionError, ExtractError, SearchError};
pub use message::{Conversation, Message, Role};
pub use source::{Source, UNAVAILABLE};

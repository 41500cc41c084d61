//! Admission gate — the per-identity request-budget check consumed by the
//! pipeline before any completion stream is opened.
//!
//! The core only defines the capability; real and no-op implementations live
//! in the gateway crate and are chosen once at process start. Denial is a
//! decision, not an error.

use std::time::Duration;

/// The outcome of an admission check. Transient — recomputed per request,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// Whether the caller may open a completion stream right now.
    pub allowed: bool,

    /// How long the caller should wait before retrying when denied.
    /// Zero when allowed.
    pub retry_after: Duration,
}

impl AdmissionDecision {
    /// An unconditionally permissive decision.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            retry_after: Duration::ZERO,
        }
    }

    /// A denial with retry guidance.
    pub fn deny(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            retry_after,
        }
    }
}

/// Gates invocation of the completion stream per caller identity.
///
/// The identity string is derived from request origin headers by the caller;
/// the gate treats it as opaque. Implementations must be safe to share
/// across concurrent requests — the per-identity counter is the only piece
/// of process-wide mutable state in the pipeline.
pub trait AdmissionGate: Send + Sync {
    /// Check whether this identity may proceed, consuming budget if so.
    fn check(&self, identity: &str) -> AdmissionDecision;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_has_zero_retry() {
        let decision = AdmissionDecision::allow();
        assert!(decision.allowed);
        assert_eq!(decision.retry_after, Duration::ZERO);
    }

    #[test]
    fn deny_carries_retry_hint() {
        let decision = AdmissionDecision::deny(Duration::from_secs(3600));
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after, Duration::from_secs(3600));
    }
}

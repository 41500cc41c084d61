//! Admission gate implementations and caller identity derivation.
//!
//! The gate applies a fixed-window budget per caller identity: a window
//! starts at an identity's first request and every request inside it draws
//! from the same budget, which refills only when the window rolls over.
//! Which gate runs (real or no-op) is decided once at process start from
//! configuration, never per request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use tracing::info;
use tutorforge_core::admission::{AdmissionDecision, AdmissionGate};

/// Evict stale windows once the map grows past this many identities.
const EVICTION_THRESHOLD: usize = 10_000;

/// In-memory fixed-window request budget.
///
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly). State is
/// process-local: a restart refills every budget.
pub struct FixedWindowGate {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, WindowSlot>>,
}

struct WindowSlot {
    started: Instant,
    used: u32,
}

impl FixedWindowGate {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl AdmissionGate for FixedWindowGate {
    fn check(&self, identity: &str) -> AdmissionDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() > EVICTION_THRESHOLD {
            let window = self.window;
            windows.retain(|_, slot| now.duration_since(slot.started) < window);
        }

        let slot = windows.entry(identity.to_string()).or_insert(WindowSlot {
            started: now,
            used: 0,
        });

        // An expired window rolls over; the budget refills in full.
        if now.duration_since(slot.started) >= self.window {
            slot.started = now;
            slot.used = 0;
        }

        if slot.used >= self.max_requests {
            let elapsed = now.duration_since(slot.started);
            return AdmissionDecision::deny(self.window.saturating_sub(elapsed));
        }

        slot.used += 1;
        AdmissionDecision::allow()
    }
}

/// Unconditionally permissive gate, used when admission is disabled.
pub struct NoopGate;

impl AdmissionGate for NoopGate {
    fn check(&self, _identity: &str) -> AdmissionDecision {
        AdmissionDecision::allow()
    }
}

/// Build the configured admission gate.
pub fn build_from_config(config: &tutorforge_config::AppConfig) -> Arc<dyn AdmissionGate> {
    if config.admission.enabled {
        info!(
            max_requests = config.admission.max_requests,
            window_minutes = config.admission.window_minutes,
            "Admission gate enabled"
        );
        Arc::new(FixedWindowGate::new(
            config.admission.max_requests,
            Duration::from_secs(config.admission.window_minutes * 60),
        ))
    } else {
        Arc::new(NoopGate)
    }
}

/// Derive the caller identity from request origin headers.
///
/// First hop of `x-forwarded-for`, then `x-real-ip`, then a fixed fallback
/// so callers with no origin headers share one budget.
pub fn client_identity(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .unwrap_or("0.0.0.0")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_boundary_is_exact() {
        let gate = FixedWindowGate::new(10, Duration::from_secs(3600));
        for i in 0..10 {
            assert!(gate.check("203.0.113.7").allowed, "request {i} denied early");
        }
        let denied = gate.check("203.0.113.7");
        assert!(!denied.allowed);
        assert!(denied.retry_after > Duration::ZERO);
    }

    #[test]
    fn identities_have_independent_budgets() {
        let gate = FixedWindowGate::new(1, Duration::from_secs(3600));
        assert!(gate.check("alpha").allowed);
        assert!(!gate.check("alpha").allowed);
        assert!(gate.check("beta").allowed);
    }

    #[test]
    fn expired_window_refills_budget() {
        let gate = FixedWindowGate::new(1, Duration::from_millis(30));
        assert!(gate.check("client").allowed);
        assert!(!gate.check("client").allowed);
        std::thread::sleep(Duration::from_millis(40));
        assert!(gate.check("client").allowed);
    }

    #[test]
    fn noop_gate_never_denies() {
        let gate = NoopGate;
        for _ in 0..1000 {
            assert!(gate.check("anyone").allowed);
        }
    }

    #[test]
    fn disabled_config_builds_noop_gate() {
        let config = tutorforge_config::AppConfig::default();
        let gate = build_from_config(&config);
        for _ in 0..100 {
            assert!(gate.check("client").allowed);
        }
    }

    #[test]
    fn identity_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "198.51.100.4, 10.0.0.1, 10.0.0.2".parse().unwrap(),
        );
        headers.insert("x-real-ip", "192.0.2.1".parse().unwrap());
        assert_eq!(client_identity(&headers), "198.51.100.4");
    }

    #[test]
    fn identity_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "192.0.2.1".parse().unwrap());
        assert_eq!(client_identity(&headers), "192.0.2.1");
    }

    #[test]
    fn identity_falls_back_to_shared_default() {
        assert_eq!(client_identity(&HeaderMap::new()), "0.0.0.0");
    }

    #[test]
    fn empty_forwarded_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "  ".parse().unwrap());
        headers.insert("x-real-ip", "192.0.2.9".parse().unwrap());
        assert_eq!(client_identity(&headers), "192.0.2.9");
    }
}

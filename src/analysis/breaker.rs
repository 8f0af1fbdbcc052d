use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Availability of one provider in the chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    /// Tripped by a failed full analysis
    Open {
        opened_at: DateTime<Utc>,
        reason: String,
    },
    /// Never usable in this process, e.g. no credential configured
    Disabled { reason: String },
}

/// Per-provider circuit breaker owned by one orchestrator.
///
/// Without a reset window a tripped provider stays open for the lifetime of
/// the breaker. With [`ProviderCircuitBreaker::with_reset`] an open provider
/// closes again once the window has elapsed. Disabled providers never close.
#[derive(Debug, Default)]
pub struct ProviderCircuitBreaker {
    states: DashMap<String, BreakerState>,
    reset_after: Option<Duration>,
}

impl ProviderCircuitBreaker {
    /// Sticky breaker with no reset path
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reset(reset_after: Duration) -> Self {
        Self {
            states: DashMap::new(),
            reset_after: Some(reset_after),
        }
    }

    /// Whether `provider` may be attempted now.
    ///
    /// An open provider whose reset window has elapsed is closed as a side effect.
    pub fn is_available(&self, provider: &str) -> bool {
        let Some(mut state) = self.states.get_mut(provider) else {
            return true;
        };

        let opened_at = match &*state {
            BreakerState::Closed => return true,
            BreakerState::Disabled { .. } => return false,
            BreakerState::Open { opened_at, .. } => *opened_at,
        };
        let Some(window) = self.reset_after else {
            return false;
        };

        let elapsed = Utc::now().signed_duration_since(opened_at);
        if elapsed >= chrono::Duration::from_std(window).unwrap_or_default() {
            info!(provider, "Reset window elapsed, re-enabling provider");
            *state = BreakerState::Closed;
            true
        } else {
            false
        }
    }

    /// Open the breaker for `provider` after a failure.
    pub fn trip(&self, provider: &str, reason: impl Into<String>) {
        let reason = reason.into();
        let mut state = self
            .states
            .entry(provider.to_string())
            .or_insert(BreakerState::Closed);

        if matches!(*state, BreakerState::Disabled { .. }) {
            return;
        }
        warn!(provider, reason = %reason, "Disabling provider for full analysis");
        *state = BreakerState::Open {
            opened_at: Utc::now(),
            reason,
        };
    }

    /// Permanently remove `provider` from the chain.
    pub fn disable(&self, provider: &str, reason: impl Into<String>) {
        self.states.insert(
            provider.to_string(),
            BreakerState::Disabled {
                reason: reason.into(),
            },
        );
    }

    /// Close a tripped provider by hand. Disabled providers stay disabled.
    pub fn force_close(&self, provider: &str) {
        if let Some(mut state) = self.states.get_mut(provider)
            && matches!(*state, BreakerState::Open { .. })
        {
            *state = BreakerState::Closed;
        }
    }

    pub fn state(&self, provider: &str) -> BreakerState {
        self.states
            .get(provider)
            .map(|state| state.clone())
            .unwrap_or(BreakerState::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sticky_breaker_never_closes() {
        let breaker = ProviderCircuitBreaker::new();
        assert!(breaker.is_available("gradient"));

        breaker.trip("gradient", "timeout");
        assert!(!breaker.is_available("gradient"));
        assert!(!breaker.is_available("gradient"));
        assert!(breaker.is_available("gemini"));
        assert!(matches!(breaker.state("gradient"), BreakerState::Open { ref reason, .. } if reason == "timeout"));
    }

    #[test]
    fn test_reset_window_closes_breaker() {
        let breaker = ProviderCircuitBreaker::with_reset(Duration::ZERO);
        breaker.trip("gemini", "rate limited");

        assert!(breaker.is_available("gemini"));
        assert_eq!(breaker.state("gemini"), BreakerState::Closed);
    }

    #[test]
    fn test_reset_window_not_elapsed() {
        let breaker = ProviderCircuitBreaker::with_reset(Duration::from_secs(3600));
        breaker.trip("gemini", "rate limited");
        assert!(!breaker.is_available("gemini"));
    }

    #[test]
    fn test_disabled_is_permanent() {
        let breaker = ProviderCircuitBreaker::with_reset(Duration::ZERO);
        breaker.disable("gradient", "no credential");
        breaker.trip("gradient", "later failure");
        breaker.force_close("gradient");

        assert!(!breaker.is_available("gradient"));
        assert!(matches!(breaker.state("gradient"), BreakerState::Disabled { .. }));
    }

    #[test]
    fn test_force_close() {
        let breaker = ProviderCircuitBreaker::new();
        breaker.trip("gradient", "boom");
        breaker.force_close("gradient");
        assert!(breaker.is_available("gradient"));
    }
}

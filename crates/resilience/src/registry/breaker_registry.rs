//! Process-wide breaker container for the known remote dependencies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::info;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, DependencyId};

/// Known remote dependency identifiers.
pub mod dependencies {
    /// Question-generation LLM provider.
    pub const LLM: &str = "LLM";
    /// Speech synthesis and recognition provider.
    pub const SPEECH: &str = "SPEECH";
    /// Backing data store.
    pub const STORAGE: &str = "STORAGE";
}

/// Container mapping dependency names to their circuit breakers.
///
/// Built once at process start and passed explicitly to call sites (or held
/// behind an accessor) rather than reached as a global, so that every call
/// site for the same dependency shares one breaker and its failure state.
/// Breakers are never removed; `reset` is the only recovery path.
pub struct BreakerRegistry {
    breakers: HashMap<DependencyId, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    /// Registry preconfigured for the known dependencies, each with
    /// thresholds matched to its observed failure characteristics: the LLM
    /// provider fails in bursts during model rollouts, the speech provider
    /// degrades quickly but recovers fast, and the data store is the
    /// slowest to come back.
    pub fn new() -> Self {
        Self::with_configs([
            (
                dependencies::LLM,
                CircuitBreakerConfig {
                    failure_threshold: 5,
                    recovery_timeout: Duration::from_secs(60),
                    monitoring_window: None,
                },
            ),
            (
                dependencies::SPEECH,
                CircuitBreakerConfig {
                    failure_threshold: 3,
                    recovery_timeout: Duration::from_secs(30),
                    monitoring_window: None,
                },
            ),
            (
                dependencies::STORAGE,
                CircuitBreakerConfig {
                    failure_threshold: 5,
                    recovery_timeout: Duration::from_secs(120),
                    monitoring_window: None,
                },
            ),
        ])
    }

    /// Build a registry for a custom dependency set.
    pub fn with_configs<I>(configs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, CircuitBreakerConfig)>,
    {
        let breakers = configs
            .into_iter()
            .map(|(dependency, config)| {
                (
                    DependencyId::Borrowed(dependency),
                    Arc::new(CircuitBreaker::with_config(dependency, config)),
                )
            })
            .collect();

        Self { breakers }
    }

    /// Look up the breaker for a dependency.
    pub fn get(&self, dependency: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(dependency).cloned()
    }

    /// Snapshots of every breaker, for observability.
    pub fn snapshots(&self) -> Vec<CircuitSnapshot> {
        self.breakers
            .values()
            .map(|breaker| breaker.snapshot())
            .collect()
    }

    /// Reset every breaker to its initial closed state.
    pub fn reset_all(&self) {
        for breaker in self.breakers.values() {
            breaker.reset();
        }
        info!("All circuit breakers reset");
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::registry::CircuitState;

    #[test]
    fn test_known_dependencies_are_registered() {
        let registry = BreakerRegistry::new();

        assert!(registry.get(dependencies::LLM).is_some());
        assert!(registry.get(dependencies::SPEECH).is_some());
        assert!(registry.get(dependencies::STORAGE).is_some());
        assert!(registry.get("PDF_PARSER").is_none());
    }

    #[test]
    fn test_lookups_share_one_breaker() {
        let registry = BreakerRegistry::new();

        let first = registry.get(dependencies::LLM).unwrap();
        let second = registry.get(dependencies::LLM).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_failure_state_is_shared_across_call_sites() {
        let registry = BreakerRegistry::with_configs([(
            dependencies::SPEECH,
            CircuitBreakerConfig {
                failure_threshold: 1,
                recovery_timeout: Duration::from_secs(60),
                monitoring_window: None,
            },
        )]);

        let handle_a = registry.get(dependencies::SPEECH).unwrap();
        let handle_b = registry.get(dependencies::SPEECH).unwrap();

        let result: Result<(), _> = handle_a
            .execute(|| async {
                Err(ApiError::Timeout {
                    dependency: dependencies::SPEECH.to_string(),
                })
            })
            .await;
        assert!(result.is_err());

        // The trip is visible through the other handle.
        assert_eq!(handle_b.snapshot().state, CircuitState::Open);
        let result: Result<(), _> = handle_b.execute(|| async { Ok(()) }).await;
        assert!(matches!(result, Err(ApiError::CircuitOpen { .. })));
    }

    #[tokio::test]
    async fn test_reset_all() {
        let registry = BreakerRegistry::with_configs([(
            dependencies::LLM,
            CircuitBreakerConfig {
                failure_threshold: 1,
                recovery_timeout: Duration::from_secs(60),
                monitoring_window: None,
            },
        )]);

        let breaker = registry.get(dependencies::LLM).unwrap();
        let result: Result<(), _> = breaker
            .execute(|| async {
                Err(ApiError::Timeout {
                    dependency: dependencies::LLM.to_string(),
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(breaker.snapshot().state, CircuitState::Open);

        registry.reset_all();
        assert_eq!(breaker.snapshot().state, CircuitState::Closed);
    }

    #[test]
    fn test_snapshots_cover_every_dependency() {
        let registry = BreakerRegistry::new();

        let snapshots = registry.snapshots();
        assert_eq!(snapshots.len(), 3);
        for snapshot in &snapshots {
            assert_eq!(snapshot.state, CircuitState::Closed);
            assert_eq!(snapshot.failures, 0);
        }
    }
}

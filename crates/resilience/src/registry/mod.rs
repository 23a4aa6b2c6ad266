//! Circuit breaker registry module.
//!
//! This module provides failure isolation for remote dependencies:
//! - Per-dependency circuit breaking with closed/open/half-open states
//! - A process-wide container mapping dependency names to their breakers

mod breaker_registry;
mod circuit_breaker;

pub use breaker_registry::{dependencies, BreakerRegistry};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState, DependencyId,
};

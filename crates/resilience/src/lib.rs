//! QuizForge Resilience Crate
//!
//! This crate provides the failure-handling layer QuizForge wraps around its
//! remote dependencies: the question-generation LLM, the speech provider, and
//! the backing data store.
//!
//! # Overview
//!
//! The resilience crate supports:
//! - A closed error taxonomy with pure retry classification
//! - Bounded retry with deterministic exponential backoff
//! - Per-dependency circuit breaking with recovery probing
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Route layer    | --> | BreakerRegistry  |  (one breaker per dependency)
//! +------------------+     +------------------+
//!                                   |
//!                                   v
//!  +------------------+    +------------------+
//!  |    with_retry    | -> |  CircuitBreaker  |  (fails fast while Open)
//!  +------------------+    +------------------+
//!                                   |
//!                                   v
//!                          +------------------+
//!                          |   remote call    |  (LLM / speech / storage)
//!                          +------------------+
//! ```
//!
//! The two guards are independent and compose either way around: a retry can
//! wrap a breaker-guarded call (rejected attempts cost nothing while the
//! circuit is open) or a breaker can wrap a whole retry sequence. Both return
//! the underlying error unchanged; only the breaker ever injects an error of
//! its own ([`ApiError::CircuitOpen`]).
//!
//! # Core Types
//!
//! - [`ApiError`] - Classified error for all remote operations
//! - [`ErrorCode`] / [`Severity`] - The classification vocabulary
//! - [`RetryOptions`] / [`ApiRetryOptions`] - Retry tuning knobs
//! - [`CircuitBreaker`] - Per-dependency closed/open/half-open guard
//! - [`BreakerRegistry`] - Dependency name to breaker container, built once
//!   at startup

pub mod errors;
pub mod registry;
pub mod retry;

// Re-export error types
pub use errors::{classify_http_status, classify_transport_error, ApiError, ErrorCode, Severity};

// Re-export retry types
pub use retry::{
    backoff_delay, with_api_retry, with_retry, ApiRetryOptions, RetryCondition, RetryObserver,
    RetryOptions,
};

// Re-export registry types
pub use registry::{
    dependencies, BreakerRegistry, CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot,
    CircuitState, DependencyId,
};

//! Per-dependency circuit breaker for fault tolerance.
//!
//! Implements the circuit breaker pattern to stop issuing calls to a remote
//! dependency during a sustained outage. The circuit has three states:
//!
//! - **Closed**: Normal operation, calls are allowed through.
//! - **Open**: Dependency is failing, calls fail fast without being issued.
//! - **HalfOpen**: A single probe call is testing whether it recovered.
//!
//! The circuit breaker is in-memory and resets on application restart.

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::errors::ApiError;

/// Type alias for remote dependency identifier.
pub type DependencyId = Cow<'static, str>;

/// Default number of consecutive failures before opening the circuit.
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time to wait before admitting a recovery probe.
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    /// Normal operation - calls are allowed.
    Closed,
    /// Dependency is failing - calls fail fast.
    Open,
    /// A recovery probe is in flight.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// Cooldown before a recovery probe is admitted.
    pub recovery_timeout: Duration,
    /// When set, a failure streak whose last failure is older than this
    /// window restarts at 1 instead of accumulating. Disabled by default.
    pub monitoring_window: Option<Duration>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            monitoring_window: None,
        }
    }
}

/// Internal circuit record.
#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure: None,
        }
    }
}

/// Observability snapshot of a breaker.
#[derive(Clone, Debug)]
pub struct CircuitSnapshot {
    /// Dependency identifier.
    pub dependency: String,
    /// Current circuit state.
    pub state: CircuitState,
    /// Number of consecutive failures.
    pub failures: u32,
    /// Time of the last failure.
    pub last_failure: Option<Instant>,
}

/// Circuit breaker guarding a single remote dependency.
///
/// Thread-safe; all call sites for the same dependency share one instance
/// (see the breaker registry) so failures observed anywhere count toward the
/// same streak. State lives in memory and resets when the process restarts.
pub struct CircuitBreaker {
    dependency: DependencyId,
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    /// Create a breaker with default settings.
    pub fn new(dependency: impl Into<DependencyId>) -> Self {
        Self::with_config(dependency, CircuitBreakerConfig::default())
    }

    /// Create a breaker with custom configuration.
    pub fn with_config(dependency: impl Into<DependencyId>, config: CircuitBreakerConfig) -> Self {
        Self {
            dependency: dependency.into(),
            config,
            circuit: Mutex::new(Circuit::new()),
        }
    }

    /// The dependency this breaker guards.
    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    /// Lock the circuit mutex, recovering from poison if necessary.
    ///
    /// For circuit breakers it's safe to recover from a poisoned mutex: the
    /// worst case is a slightly incorrect circuit state, which is better than
    /// panicking.
    fn lock_circuit(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(|poisoned| {
            warn!(
                "Circuit breaker '{}': mutex was poisoned, recovering",
                self.dependency
            );
            poisoned.into_inner()
        })
    }

    /// Execute an operation through the breaker.
    ///
    /// While the circuit is open and the cooldown has not elapsed, the
    /// operation is not invoked at all and the call fails fast with
    /// [`ApiError::CircuitOpen`]. Once the cooldown elapses, exactly one call
    /// is admitted as a recovery probe; its outcome decides whether the
    /// circuit closes or re-opens. Pass-through results and errors are
    /// returned unchanged.
    ///
    /// The outcome is recorded in the same continuation that observes it, so
    /// concurrent calls cannot each cross the threshold independently.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if !self.try_acquire() {
            debug!(
                "Circuit breaker '{}': open, rejecting call",
                self.dependency
            );
            return Err(ApiError::CircuitOpen {
                dependency: self.dependency.to_string(),
            });
        }

        match operation().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(error) => {
                self.record_failure();
                Err(error)
            }
        }
    }

    /// Decide whether a call may proceed, transitioning Open -> HalfOpen when
    /// the cooldown has elapsed. The caller admitted on that transition is
    /// the single probe; further calls are rejected until its outcome lands.
    fn try_acquire(&self) -> bool {
        let mut circuit = self.lock_circuit();

        match circuit.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                // A probe is already in flight.
                false
            }
            CircuitState::Open => {
                if let Some(last_failure) = circuit.last_failure {
                    if last_failure.elapsed() >= self.config.recovery_timeout {
                        info!(
                            "Circuit breaker '{}': cooldown elapsed, admitting probe",
                            self.dependency
                        );
                        circuit.state = CircuitState::HalfOpen;
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Record a successful call.
    fn record_success(&self) {
        let mut circuit = self.lock_circuit();

        match circuit.state {
            CircuitState::Closed => {
                circuit.consecutive_failures = 0;
                debug!(
                    "Circuit breaker '{}': success, failure streak reset",
                    self.dependency
                );
            }
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker '{}': probe succeeded, closing circuit",
                    self.dependency
                );
                circuit.state = CircuitState::Closed;
                circuit.consecutive_failures = 0;
                circuit.last_failure = None;
            }
            CircuitState::Open => {
                // Shouldn't happen - execute never admits calls while Open.
                debug!(
                    "Circuit breaker '{}': unexpected success while Open",
                    self.dependency
                );
            }
        }
    }

    /// Record a failed call.
    fn record_failure(&self) {
        let mut circuit = self.lock_circuit();

        match circuit.state {
            CircuitState::Closed => {
                if let (Some(window), Some(last_failure)) =
                    (self.config.monitoring_window, circuit.last_failure)
                {
                    if last_failure.elapsed() >= window {
                        debug!(
                            "Circuit breaker '{}': failure streak expired, restarting count",
                            self.dependency
                        );
                        circuit.consecutive_failures = 0;
                    }
                }

                circuit.consecutive_failures += 1;
                circuit.last_failure = Some(Instant::now());

                if circuit.consecutive_failures >= self.config.failure_threshold {
                    info!(
                        "Circuit breaker '{}': opening after {} consecutive failures",
                        self.dependency, circuit.consecutive_failures
                    );
                    circuit.state = CircuitState::Open;
                } else {
                    debug!(
                        "Circuit breaker '{}': failure {}/{}",
                        self.dependency, circuit.consecutive_failures, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker '{}': probe failed, reopening",
                    self.dependency
                );
                circuit.consecutive_failures += 1;
                circuit.last_failure = Some(Instant::now());
                circuit.state = CircuitState::Open;
            }
            CircuitState::Open => {
                circuit.last_failure = Some(Instant::now());
                debug!(
                    "Circuit breaker '{}': failure recorded while already Open",
                    self.dependency
                );
            }
        }
    }

    /// Get a snapshot of the current state. Does not mutate.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let circuit = self.lock_circuit();

        CircuitSnapshot {
            dependency: self.dependency.to_string(),
            state: circuit.state,
            failures: circuit.consecutive_failures,
            last_failure: circuit.last_failure,
        }
    }

    /// Unconditionally return the circuit to its initial closed state.
    ///
    /// Used for administrative recovery and test isolation.
    pub fn reset(&self) {
        let mut circuit = self.lock_circuit();

        info!(
            "Circuit breaker '{}': manual reset from {}",
            self.dependency, circuit.state
        );
        circuit.state = CircuitState::Closed;
        circuit.consecutive_failures = 0;
        circuit.last_failure = None;
    }
}

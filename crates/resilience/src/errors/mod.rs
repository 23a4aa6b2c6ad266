//! Error types and retry classification for remote dependency calls.
//!
//! This module provides:
//! - [`ApiError`]: The classified error enum for all remote operations
//! - [`ErrorCode`] / [`Severity`]: The closed classification vocabulary
//! - [`classify_transport_error`] / [`classify_http_status`]: The single
//!   translation point where raw transport failures become classified ones

mod code;

pub use code::{ErrorCode, Severity};

use thiserror::Error;

/// Errors surfaced by calls to remote dependencies.
///
/// Each variant maps to exactly one [`ErrorCode`] via [`code`](Self::code),
/// which in turn determines retryability. Classification is a pure function
/// of the error value; severity is informational and never consulted by the
/// retry logic.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request failed in transit before a response arrived.
    /// Should retry with exponential backoff.
    #[error("Network error: {message}")]
    Network {
        /// Description of the transport failure
        message: String,
    },

    /// A connection to the dependency could not be established.
    /// Should retry with exponential backoff.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure
        message: String,
    },

    /// The dependency reported itself unavailable (HTTP 502/503/504).
    /// Should retry with exponential backoff.
    #[error("Service unavailable: {dependency}")]
    ServiceUnavailable {
        /// The dependency that is unavailable
        dependency: String,
    },

    /// The dependency throttled the request (HTTP 429).
    /// Should retry with exponential backoff.
    #[error("Rate limited: {dependency}")]
    RateLimited {
        /// The dependency that throttled the request
        dependency: String,
    },

    /// The request to the dependency timed out.
    /// Should retry with exponential backoff.
    #[error("Timeout: {dependency}")]
    Timeout {
        /// The dependency that timed out
        dependency: String,
    },

    /// The dependency rejected the payload as invalid.
    /// This is a terminal error - retrying won't help.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// The caller supplied input the dependency cannot process.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected input
        message: String,
    },

    /// The credentials lack permission for the operation.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation
        message: String,
    },

    /// The requested resource was not found by the dependency.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The configured API key was rejected by the dependency.
    /// Terminal until the key is rotated.
    #[error("Invalid API key for {dependency}")]
    ApiKeyInvalid {
        /// The dependency that rejected the key
        dependency: String,
    },

    /// The account's API quota is exhausted.
    /// Terminal until the quota resets; reportable.
    #[error("API quota exceeded: {dependency}")]
    QuotaExceeded {
        /// The dependency whose quota is exhausted
        dependency: String,
    },

    /// The circuit breaker is open for this dependency.
    /// Synthesized by the breaker itself, never by the underlying operation.
    #[error("Circuit open: {dependency}")]
    CircuitOpen {
        /// The dependency with an open circuit
        dependency: String,
    },

    /// A failure that fits no other variant. Reportable.
    #[error("Unknown error: {message}")]
    Unknown {
        /// Description of the failure
        message: String,
    },
}

impl ApiError {
    /// Returns the classification code for this error.
    ///
    /// [`CircuitOpen`](Self::CircuitOpen) classifies as
    /// [`ErrorCode::ServiceUnavailable`]: from the caller's point of view the
    /// dependency is unavailable, whether the dependency said so or the
    /// breaker did. The two remain distinguishable through
    /// [`severity`](Self::severity).
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Network { .. } => ErrorCode::NetworkError,
            Self::Connection { .. } => ErrorCode::ConnectionError,
            Self::ServiceUnavailable { .. } | Self::CircuitOpen { .. } => {
                ErrorCode::ServiceUnavailable
            }
            Self::RateLimited { .. } => ErrorCode::RateLimit,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::ValidationFailed { .. } => ErrorCode::ValidationError,
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::ApiKeyInvalid { .. } => ErrorCode::ApiKeyInvalid,
            Self::QuotaExceeded { .. } => ErrorCode::ApiQuotaExceeded,
            Self::Unknown { .. } => ErrorCode::UnknownError,
        }
    }

    /// Returns true if this error is worth retrying.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizforge_resilience::errors::ApiError;
    ///
    /// let error = ApiError::RateLimited { dependency: "LLM".to_string() };
    /// assert!(error.is_retryable());
    ///
    /// let error = ApiError::ValidationFailed { message: "empty quiz".to_string() };
    /// assert!(!error.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// Returns true if this error should be sent to monitoring by default.
    pub fn is_reportable(&self) -> bool {
        self.code().is_reportable()
    }

    /// Returns the severity of this error.
    ///
    /// An open circuit is `Critical` while an ordinary single-call
    /// `ServiceUnavailable` is `High`, so sustained outages stand out in logs.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Network { .. }
            | Self::Connection { .. }
            | Self::RateLimited { .. }
            | Self::Timeout { .. } => Severity::Medium,
            Self::ServiceUnavailable { .. } => Severity::High,
            Self::ValidationFailed { .. } | Self::InvalidInput { .. } | Self::NotFound(_) => {
                Severity::Low
            }
            Self::PermissionDenied { .. } | Self::QuotaExceeded { .. } | Self::Unknown { .. } => {
                Severity::High
            }
            Self::ApiKeyInvalid { .. } | Self::CircuitOpen { .. } => Severity::Critical,
        }
    }

    /// End-user-facing description of this error.
    ///
    /// Opaque to the retry and breaker logic; surfaced verbatim by the UI
    /// layer.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network { .. } | Self::Connection { .. } => {
                "A network problem interrupted the request. Check your connection and try again."
            }
            Self::ServiceUnavailable { .. } | Self::CircuitOpen { .. } => {
                "The service is temporarily unavailable. Please try again in a few minutes."
            }
            Self::RateLimited { .. } => {
                "The service is busy right now. Please wait a moment and try again."
            }
            Self::Timeout { .. } => "The request took too long. Please try again.",
            Self::ValidationFailed { .. } | Self::InvalidInput { .. } => {
                "The request could not be processed. Please check your input and try again."
            }
            Self::PermissionDenied { .. } => "You don't have permission to perform this action.",
            Self::NotFound(_) => "The requested item could not be found.",
            Self::ApiKeyInvalid { .. } | Self::QuotaExceeded { .. } => {
                "The service is misconfigured. Please contact support."
            }
            Self::Unknown { .. } => "Something went wrong. Please try again.",
        }
    }
}

/// Translate a raw transport failure into the taxonomy.
///
/// This is the boundary where untyped errors become classified ones; nothing
/// past this point inspects the raw error.
pub fn classify_transport_error(dependency: &str, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout {
            dependency: dependency.to_string(),
        }
    } else if error.is_connect() {
        ApiError::Connection {
            message: error.to_string(),
        }
    } else {
        ApiError::Network {
            message: error.to_string(),
        }
    }
}

/// Translate an HTTP response status into the taxonomy.
///
/// Returns `None` for success statuses.
pub fn classify_http_status(dependency: &str, status: reqwest::StatusCode) -> Option<ApiError> {
    use reqwest::StatusCode;

    if status.is_success() {
        return None;
    }

    let error = match status {
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
            dependency: dependency.to_string(),
        },
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            ApiError::ServiceUnavailable {
                dependency: dependency.to_string(),
            }
        }
        StatusCode::REQUEST_TIMEOUT => ApiError::Timeout {
            dependency: dependency.to_string(),
        },
        StatusCode::UNAUTHORIZED => ApiError::ApiKeyInvalid {
            dependency: dependency.to_string(),
        },
        StatusCode::PAYMENT_REQUIRED => ApiError::QuotaExceeded {
            dependency: dependency.to_string(),
        },
        StatusCode::FORBIDDEN => ApiError::PermissionDenied {
            message: format!("HTTP 403 from {}", dependency),
        },
        StatusCode::NOT_FOUND => ApiError::NotFound(format!("HTTP 404 from {}", dependency)),
        s if s.is_client_error() => ApiError::InvalidInput {
            message: format!("HTTP {} from {}", s, dependency),
        },
        s => ApiError::Unknown {
            message: format!("HTTP {} from {}", s, dependency),
        },
    };

    Some(error)
}

use serde::{Deserialize, Serialize};

/// Symbolic error kind for classified failures.
///
/// This is a closed taxonomy: every failure surfaced by a remote operation
/// carries exactly one code, and the code alone decides retryability.
///
/// # Behavior Summary
///
/// | Code | Retryable? | Reportable by default? |
/// |------|-----------|------------------------|
/// | `network-error` | Yes | No |
/// | `connection-error` | Yes | No |
/// | `service-unavailable` | Yes | No |
/// | `rate-limit` | Yes | No |
/// | `timeout` | Yes | No |
/// | `validation-error` | No | No |
/// | `invalid-input` | No | No |
/// | `permission-denied` | No | No |
/// | `not-found` | No | No |
/// | `api-key-invalid` | No | No |
/// | `api-quota-exceeded` | No | Yes |
/// | `unknown-error` | No | Yes |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// The request failed in transit before a response arrived.
    NetworkError,
    /// A connection to the dependency could not be established.
    ConnectionError,
    /// The dependency reported itself unavailable (or its circuit is open).
    ServiceUnavailable,
    /// The dependency throttled the request.
    RateLimit,
    /// The request exceeded its deadline.
    Timeout,
    /// The dependency rejected the payload as invalid.
    ValidationError,
    /// The caller supplied input the dependency cannot process.
    InvalidInput,
    /// The credentials lack permission for the operation.
    PermissionDenied,
    /// The requested resource does not exist.
    NotFound,
    /// The configured API key was rejected.
    ApiKeyInvalid,
    /// The account's API quota is exhausted.
    ApiQuotaExceeded,
    /// A failure that fits no other code.
    UnknownError,
}

impl ErrorCode {
    /// Returns true if a failure with this code is worth retrying.
    ///
    /// Only transient transport and availability failures qualify; everything
    /// else would fail identically on the next attempt.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::NetworkError
                | Self::ConnectionError
                | Self::ServiceUnavailable
                | Self::RateLimit
                | Self::Timeout
        )
    }

    /// Returns true if a failure with this code should be sent to monitoring
    /// by default.
    pub fn is_reportable(self) -> bool {
        matches!(self, Self::ApiQuotaExceeded | Self::UnknownError)
    }

    /// The wire name of this code (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => "network-error",
            Self::ConnectionError => "connection-error",
            Self::ServiceUnavailable => "service-unavailable",
            Self::RateLimit => "rate-limit",
            Self::Timeout => "timeout",
            Self::ValidationError => "validation-error",
            Self::InvalidInput => "invalid-input",
            Self::PermissionDenied => "permission-denied",
            Self::NotFound => "not-found",
            Self::ApiKeyInvalid => "api-key-invalid",
            Self::ApiQuotaExceeded => "api-quota-exceeded",
            Self::UnknownError => "unknown-error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a classified failure is.
///
/// Severity is informational: it drives log levels and reporting, never the
/// retry decision.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine, usually caller-correctable.
    Low,
    /// Transient; expected to clear on its own.
    Medium,
    /// Degraded service or misconfiguration.
    High,
    /// Sustained outage or broken credentials.
    Critical,
}

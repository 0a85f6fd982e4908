//! Error types for the omnisearch-fanout crate.
//!
//! Provider adapters report failures as a tagged [`ProviderError`]. The
//! [`ErrorKind`] is decided once, at the adapter boundary, and the retry
//! classifier only ever looks at the tag. Each kind carries a stable code
//! (SCREAMING_SNAKE_CASE) that is included in the Display output.

use std::fmt;

/// Stable error codes for programmatic error handling.
///
/// These codes never change. Use them rather than parsing Display output.
pub mod error_codes {
    /// Provider throttled the request (HTTP 429).
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    /// Credentials missing, expired or rejected (HTTP 401).
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    /// Credentials valid but lacking permission (HTTP 403).
    pub const FORBIDDEN: &str = "FORBIDDEN";
    /// Resource does not exist (HTTP 404).
    pub const NOT_FOUND: &str = "NOT_FOUND";
    /// Provider rejected the request shape (HTTP 400/422).
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    /// Upstream 5xx.
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    /// Transport-level failure before a response arrived.
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    /// The attempt exceeded its deadline.
    pub const TIMEOUT: &str = "TIMEOUT";
    /// The attempt was cancelled by the caller.
    pub const CANCELLED: &str = "CANCELLED";
    /// Anything not covered above.
    pub const OTHER: &str = "OTHER";
}

/// Transport-level failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkFailure {
    /// Peer reset the connection.
    ConnectionReset,
    /// DNS resolution failed.
    HostNotFound,
    /// TCP/TLS connect did not complete in time.
    ConnectTimeout,
    /// Peer refused the connection.
    ConnectionRefused,
    /// Some other transport failure (TLS handshake, protocol error, ...).
    Other,
}

/// What went wrong with a provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// HTTP 429.
    RateLimited,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 403.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// HTTP 400 / 422.
    BadRequest,
    /// HTTP 5xx, carrying the exact status.
    ServerError(u16),
    /// Transport failure.
    Network(NetworkFailure),
    /// Attempt deadline exceeded.
    Timeout,
    /// Cancelled by the caller (orchestrator shutdown).
    Cancelled,
    /// Unclassified.
    Other,
}

impl ErrorKind {
    /// Classify a non-success HTTP-like status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            408 => Self::Timeout,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError(status),
            _ => Self::Other,
        }
    }

    /// The HTTP-like status this kind represents, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest => Some(400),
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::RateLimited => Some(429),
            Self::ServerError(status) => Some(*status),
            _ => None,
        }
    }

    /// Returns the stable error code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited => error_codes::RATE_LIMITED,
            Self::Unauthorized => error_codes::UNAUTHORIZED,
            Self::Forbidden => error_codes::FORBIDDEN,
            Self::NotFound => error_codes::NOT_FOUND,
            Self::BadRequest => error_codes::BAD_REQUEST,
            Self::ServerError(_) => error_codes::SERVER_ERROR,
            Self::Network(_) => error_codes::NETWORK_ERROR,
            Self::Timeout => error_codes::TIMEOUT,
            Self::Cancelled => error_codes::CANCELLED,
            Self::Other => error_codes::OTHER,
        }
    }

    /// Returns true if this kind represents a transient failure worth retrying.
    ///
    /// Retryable:
    /// - connection reset, host not found, connect timeout, connection refused
    /// - HTTP 429, 502, 503, 504
    /// - attempt timeouts
    ///
    /// Everything else, in particular 401/403/404, will not resolve on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Timeout => true,
            Self::ServerError(status) => matches!(status, 502..=504),
            Self::Network(failure) => !matches!(failure, NetworkFailure::Other),
            Self::Unauthorized
            | Self::Forbidden
            | Self::NotFound
            | Self::BadRequest
            | Self::Cancelled
            | Self::Other => false,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerError(status) => write!(f, "{} {status}", self.code()),
            _ => f.write_str(self.code()),
        }
    }
}

/// A failed provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{}] {}", .kind.code(), .message)]
pub struct ProviderError {
    /// Classification, decided by the adapter.
    pub kind: ErrorKind,
    /// Human-readable detail. Never contains credentials.
    pub message: String,
}

impl ProviderError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an error from a non-success HTTP-like status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_status(status), message)
    }

    /// Create a transport failure.
    pub fn network(failure: NetworkFailure, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network(failure), message)
    }

    /// Create an attempt-timeout failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a cancellation failure.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create an unclassified failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Other, message)
    }

    /// Returns true if the call is worth retrying.
    ///
    /// Delegates to [`ErrorKind::is_retryable`], with one extra rule for
    /// errors the adapter could not classify ([`ErrorKind::Other`] and
    /// [`NetworkFailure::Other`]): a message that says the call timed out is
    /// treated as a timeout.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Other | ErrorKind::Network(NetworkFailure::Other) => {
                message_indicates_timeout(&self.message)
            }
            kind => kind.is_retryable(),
        }
    }
}

/// Retry classifier: decide whether `error` is transient.
pub fn is_retryable(error: &ProviderError) -> bool {
    error.is_retryable()
}

fn message_indicates_timeout(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("timeout") || lower.contains("timed out")
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind as Io;
        let kind = match err.kind() {
            Io::ConnectionReset | Io::ConnectionAborted | Io::BrokenPipe => {
                ErrorKind::Network(NetworkFailure::ConnectionReset)
            }
            Io::ConnectionRefused => ErrorKind::Network(NetworkFailure::ConnectionRefused),
            Io::TimedOut => ErrorKind::Timeout,
            Io::NotConnected | Io::AddrNotAvailable => {
                ErrorKind::Network(NetworkFailure::Other)
            }
            _ => ErrorKind::Other,
        };
        Self::new(kind, err.to_string())
    }
}

/// Errors raised by the engine itself (never by provider calls).
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    /// Invalid engine configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, FanoutError>;

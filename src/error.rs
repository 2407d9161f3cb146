//! Error types for msil-extract
//!
//! Every failure that can abort an extraction run is represented by [`Error`]:
//! - Configuration problems (missing credential, invalid page size, bad URLs)
//! - Remote failures, split into HTTP status errors, service-level error
//!   objects and transport failures
//! - Serialization and filesystem failures while reading responses or writing
//!   collections
//!
//! Whether a failure is transient is decided by [`crate::retry::IsRetryable`].

use thiserror::Error;

/// Result type alias for msil-extract operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP status codes the remote service uses for rate limiting and overload
pub const TRANSIENT_STATUS_CODES: [u16; 2] = [429, 503];

/// Maximum number of response body characters kept in an [`Error::Http`]
pub const ERROR_BODY_LIMIT: usize = 500;

/// Main error type for msil-extract
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "paging.page_size")
        key: Option<String>,
    },

    /// The service answered with a non-success HTTP status
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        /// Response status code
        status: u16,
        /// Request URL without query string
        url: String,
        /// Leading part of the response body (at most [`ERROR_BODY_LIMIT`] chars)
        body: String,
    },

    /// The service answered 200 but embedded an error object in the payload
    #[error("service error {code}: {message}")]
    Service {
        /// Error code reported by the service
        code: i64,
        /// Error message reported by the service
        message: String,
    },

    /// Network error (connect, timeout, interrupted body)
    ///
    /// Built through `From`, which strips the request URL: the query string
    /// carries the subscription key.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Build an [`Error::Http`], truncating the body to [`ERROR_BODY_LIMIT`] characters
    pub fn http(status: u16, url: impl Into<String>, body: &str) -> Self {
        Error::Http {
            status,
            url: url.into(),
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        }
    }

    /// HTTP or service status code carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Service { code, .. } => u16::try_from(*code).ok(),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.without_url())
    }
}

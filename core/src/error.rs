//! Error types for the service client.
//!
//! # Design
//! Every failed call ends in exactly one `ServiceError`. `TransportError`
//! covers failures below the application protocol: connectivity, timeouts,
//! unacceptable status codes and bodies that do not decode. `ApiError` is the
//! structured `{ "errorCode", "message" }` payload a backend returns with a
//! failure status. Which of the two reaches the caller is decided by
//! `ErrorSurfacing` in the client configuration.

use std::fmt;

use thiserror::Error;

/// Result of every call issued through the client.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure originating below the application protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established or broke mid-flight.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request or resource timeout elapsed before a reply arrived.
    #[error("request timed out")]
    Timeout,

    /// The server replied with a status code outside 200..300.
    #[error("response status code was unacceptable: {status}")]
    UnacceptableStatus { status: u16 },

    /// The response body could not be decoded into the expected type.
    #[error("response could not be decoded: {0}")]
    Decode(String),

    /// The request could not be built (bad header value, bad URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Structured error payload extracted from a failed response.
///
/// Both fields are best-effort: a payload carrying neither is still an
/// `ApiError`, just an uninformative one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub error_code: Option<i64>,
    pub message: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(code) = self.error_code {
            write!(f, " (error code {code})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// The normalized error surfaced to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("api error: {0}")]
    Api(ApiError),

    /// A JSON body arrived with a status outside the recognized failure range.
    #[error("unexpected status code {status}")]
    UnexpectedStatus { status: u16 },
}

impl ServiceError {
    /// The transport failure behind this error, if it is one.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            ServiceError::Transport(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ServiceError::Transport(TransportError::Timeout))
    }
}

/// Errors raised while assembling a client, before any call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid value {value:?} for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

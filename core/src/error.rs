//! Error types for the request pipeline.
//!
//! # Design
//! Every failed run lands in exactly one `ApiError` kind: the transport never
//! produced a status, the status was outside 2xx, or a 2xx body did not
//! decode into the requested model. Error-status bodies are never inspected.
//! Malformed URLs are a construction fault (`BuildError`) raised while
//! building the request, not a runtime `ApiError`.

use thiserror::Error;

use crate::http::RawResponse;

/// A failure reported by the transport before any status code was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFault {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("transport failure: {0}")]
    Other(String),
}

/// A 2xx body that could not be decoded into the requested model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecodeFault {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<serde_json::Error> for DecodeFault {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Closed taxonomy of run failures.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    TransportError(TransportFault),

    #[error("unexpected HTTP status {0}")]
    StatusCodeError(u16),

    #[error("response body did not decode: {0}")]
    ContentSerializeError(DecodeFault),
}

/// Payload-free discriminant of `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    Transport,
    StatusCode,
    ContentSerialize,
}

impl ApiErrorKind {
    /// Stable numeric code, suitable for logs and foreign callers.
    pub fn code(self) -> i32 {
        match self {
            ApiErrorKind::Transport => 1,
            ApiErrorKind::StatusCode => 2,
            ApiErrorKind::ContentSerialize => 3,
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::TransportError(_) => ApiErrorKind::Transport,
            ApiError::StatusCodeError(_) => ApiErrorKind::StatusCode,
            ApiError::ContentSerializeError(_) => ApiErrorKind::ContentSerialize,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::StatusCodeError(status) => Some(*status),
            _ => None,
        }
    }
}

/// Faults compare by kind only; status codes compare by value.
impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.status() == other.status()
    }
}

impl Eq for ApiError {}

impl From<TransportFault> for ApiError {
    fn from(fault: TransportFault) -> Self {
        ApiError::TransportError(fault)
    }
}

impl From<DecodeFault> for ApiError {
    fn from(fault: DecodeFault) -> Self {
        ApiError::ContentSerializeError(fault)
    }
}

/// Raised by `RequestFactory::build` when domain and path do not form a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Map a transport outcome to the body of a 2xx response or an `ApiError`.
///
/// Non-2xx responses are rejected without looking at the body.
pub fn classify(outcome: Result<RawResponse, TransportFault>) -> Result<Vec<u8>, ApiError> {
    let response = outcome?;
    if !response.is_success() {
        return Err(ApiError::StatusCodeError(response.status));
    }
    Ok(response.body)
}

//! Error types.
//!
//! Two families exist. [`ConfigError`] is returned synchronously while building a
//! [`RequestConfig`](crate::RequestConfig) or a transport. [`FetchError`] is never
//! returned from a method: it is handed to the `on_error` handler of a
//! [`BlobRequest`](crate::BlobRequest) once a transfer has failed.

/// Errors raised while building configuration or transports.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No URL configured")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid content type pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    #[error("Event channel capacity must be at least 1")]
    ZeroCapacity,

    #[error("No tokio runtime available to drive the transport")]
    NoRuntime,

    #[error("Cannot build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Network-level failures reported by a transport before a response completed.
///
/// Kept `Clone` so scripted transports can replay the same failure more than once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request could not be sent or no response head was received.
    #[error("Request failed: {0}")]
    Request(String),

    /// The response body broke off while streaming.
    #[error("Body read failed after {loaded} bytes: {reason}")]
    Body { loaded: u64, reason: String },

    /// The transport went away without reporting an outcome.
    #[error("Transport closed before the transfer completed")]
    Closed,
}

impl TransportError {
    pub(crate) fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Failure of a single transfer, as delivered to the `on_error` handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// No response was completed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response was completed with a status outside `200..300`.
    #[error("Unexpected status {status} {status_text}")]
    Status { status: u16, status_text: String },

    /// A response was completed but its content type does not match the expectation.
    #[error("Response type {actual:?} did not match expected type {expected}")]
    TypeMismatch { expected: String, actual: String },
}

impl FetchError {
    /// True for network failures where no response was completed.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }

    /// True when a response arrived but was not accepted (status or content type).
    pub fn is_rejected(&self) -> bool {
        matches!(self, FetchError::Status { .. } | FetchError::TypeMismatch { .. })
    }
}

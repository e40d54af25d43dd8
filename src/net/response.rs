//! Response model for a binary transfer.
//!
//! A transfer produces two pieces of data:
//! - a [`ResponseHead`] as soon as the status line and headers have arrived, and
//! - a [`Blob`] once the whole body has been received.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names.
//! - `status_text` is derived from the status code's canonical reason phrase
//!   and is `"Unknown"` for non-standard codes.
//! - A blob's content type is empty when the response carried no `Content-Type`.
//!
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderMap;
use url::Url;

/// Status line and headers of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// Final URL of the response (after redirects), when the transport knows it.
    pub url: Option<Url>,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// Creates a head with the canonical reason phrase for `status`.
    pub fn new(status: u16, headers: HeaderMap) -> Self {
        Self {
            url: None,
            status,
            status_text: status_text_for(status),
            headers,
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// True when the status is in `200..300`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Declared `Content-Type`, or an empty string when absent or not valid ASCII.
    pub fn content_type(&self) -> String {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    /// Declared `Content-Length`, if present and parseable.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
    }
}

/// Canonical reason phrase for a status code, `"Unknown"` if there is none.
pub(crate) fn status_text_for(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
        .to_string()
}

/// Fully received binary body together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    content_type: String,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Size of the body in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Declared content type, as sent by the server (may include parameters).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// MIME essence of the content type: lower-cased `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        mime_essence(&self.content_type)
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Strips parameters and whitespace from a content type and lower-cases it.
pub(crate) fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

//! Binary HTTP GET requests with progress reporting and an optional content type check.
//!
//! A [`BlobRequest`] wraps one transfer. It reports progress while the body arrives,
//! then either accepts the response (status 2xx and matching content type) or rejects
//! it, and finally calls its load handler. Transfers run on a [`Transport`]:
//! [`ReqwestTransport`] for the network, [`ScriptedTransport`] for canned responses.
//!
//! ```no_run
//! # async fn demo() -> Result<(), blobfetch::ConfigError> {
//! let mut req = blobfetch::fetch(
//!     "https://example.com/archive.zip",
//!     |req| println!("{} bytes", req.bytes_loaded()),
//!     |_, err| eprintln!("{err}"),
//! )?;
//! req.run().await;
//! # Ok(()) }
//! ```

pub mod config;
pub mod errors;
pub mod events;
pub mod expect;
pub mod net;
pub mod request;

#[cfg(test)]
mod test_log;

pub use config::{RequestConfig, RequestConfigBuilder, TransportConfig, TransportConfigBuilder};
pub use errors::{ConfigError, FetchError, TransportError};
pub use events::{ProgressEvent, TransportEvent};
pub use expect::ExpectedType;
pub use net::{Blob, ReqwestTransport, ResponseHead, ScriptedTransport, Transport};
pub use request::{AbortHandle, BlobRequest, RequestId, RequestState};

use std::sync::Arc;

/// Starts a GET for `url` over a default [`ReqwestTransport`] on the current tokio runtime.
pub fn fetch<S, E>(url: &str, on_success: S, on_error: E) -> Result<BlobRequest, ConfigError>
where
    S: FnMut(&BlobRequest) + Send + 'static,
    E: FnMut(&BlobRequest, &FetchError) + Send + 'static,
{
    let transport = Arc::new(ReqwestTransport::new(TransportConfig::default())?);
    BlobRequest::get(url, transport, on_success, on_error)
}

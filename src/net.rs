//! Network layer.
//!
//! The [`Transport`] trait is the seam between a [`BlobRequest`](crate::BlobRequest) and
//! whatever actually moves bytes. Two transports ship with the crate:
//!
//! - [`ReqwestTransport`]: real HTTP(S) over `reqwest`, driven on a tokio runtime.
//! - [`ScriptedTransport`]: replays a fixed list of events without touching the network.

mod fetch;
mod response;
mod scripted;
mod transport;

pub use fetch::ReqwestTransport;
pub use response::{Blob, ResponseHead};
pub(crate) use response::{mime_essence, status_text_for};
pub use scripted::ScriptedTransport;
pub use transport::{Transport, DEFAULT_CHANNEL_CAPACITY};

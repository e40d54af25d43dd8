use crate::events::TransportEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Default number of events buffered between a transport and its request.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Binary HTTP client capability used by a [`BlobRequest`](crate::BlobRequest).
///
/// A transport opens exactly one GET transfer per call to [`Transport::open`] and reports
/// its lifecycle as an ordered stream of [`TransportEvent`]s on the returned receiver:
///
/// - zero or one [`TransportEvent::Head`],
/// - zero or more [`TransportEvent::Progress`],
/// - exactly one terminal event ([`TransportEvent::Load`], [`TransportEvent::Error`] or
///   [`TransportEvent::Abort`]), after which the sender is dropped.
///
/// When `cancel` fires, the transport stops the transfer and may drop the sender
/// without emitting a terminal event.
pub trait Transport: Send + Sync {
    fn open(&self, url: &Url, cancel: CancellationToken) -> mpsc::Receiver<TransportEvent>;
}

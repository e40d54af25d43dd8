//! Event types flowing from a transport into a [`BlobRequest`](crate::BlobRequest).
//!
//! A transport emits [`TransportEvent`]s in order over a channel. The request
//! consumes them one at a time from its event pump, so no two events for the
//! same request are ever handled concurrently.
//!
//! # Main Types
//!
//! - [`ProgressEvent`]: bytes received so far, and the expected total when known.
//! - [`TransportEvent`]: lifecycle events of a single transfer (head, progress, load, error, abort).

use crate::errors::TransportError;
use crate::net::{Blob, ResponseHead};

/// Progress of a transfer, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Number of body bytes received so far.
    pub loaded: u64,
    /// Expected number of body bytes, if the transport knows it.
    pub total: Option<u64>,
}

impl ProgressEvent {
    pub fn new(loaded: u64, total: Option<u64>) -> Self {
        Self { loaded, total }
    }

    /// True when the total size of the transfer is known.
    pub fn length_computable(&self) -> bool {
        self.total.is_some()
    }

    /// Fraction of the body received, in `0.0..=1.0`. `None` when the total is unknown.
    pub fn ratio(&self) -> Option<f64> {
        self.total.map(|total| ratio(self.loaded, total))
    }
}

/// Ratio of `loaded` over `total`, clamped to `0.0..=1.0`. An empty total counts as done.
pub(crate) fn ratio(loaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (loaded as f64 / total as f64).clamp(0.0, 1.0)
}

/// A single lifecycle event of a transfer.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Response status line and headers have been received.
    Head(ResponseHead),
    /// More body bytes have been received. May occur any number of times.
    Progress(ProgressEvent),
    /// The response completed, regardless of its HTTP status.
    Load(Blob),
    /// The transfer failed at the network level. No response was completed.
    Error(TransportError),
    /// The transport itself gave up on the transfer.
    Abort,
}

impl TransportEvent {
    /// True for events after which the transport will not emit anything else.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportEvent::Load(_) | TransportEvent::Error(_) | TransportEvent::Abort)
    }
}

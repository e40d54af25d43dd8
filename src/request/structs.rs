use crate::events::TransportEvent;
use std::fmt::{Display, Formatter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A unique identifier for a [`BlobRequest`](crate::BlobRequest), used to correlate log lines.
///
/// **Note:** The use of [`Uuid`] is an implementation detail; treat `RequestId` as an
/// opaque handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current state of a request. `Idle → Loading` happens at most once, and the three
/// terminal states are never left.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// Created but not started.
    #[default]
    Idle,
    /// The transfer is in flight.
    Loading,
    /// A response completed and was accepted.
    Succeeded,
    /// The transfer failed, or a completed response was rejected.
    Failed,
    /// The transfer was cancelled by the caller.
    Aborted,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Succeeded | RequestState::Failed | RequestState::Aborted)
    }
}

impl Display for RequestState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestState::Idle => write!(f, "Idle"),
            RequestState::Loading => write!(f, "Loading"),
            RequestState::Succeeded => write!(f, "Succeeded"),
            RequestState::Failed => write!(f, "Failed"),
            RequestState::Aborted => write!(f, "Aborted"),
        }
    }
}

/// The in-flight transfer owned by a loading request.
pub(crate) struct ActiveTransfer {
    pub events: mpsc::Receiver<TransportEvent>,
    pub cancel: CancellationToken,
}

/// Requests cancellation of a loading [`BlobRequest`](crate::BlobRequest) from anywhere.
///
/// The abort path (state change and `on_abort`) runs the next time the owner pumps
/// events for that request. Aborting a request that has already finished does nothing.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    cancel: CancellationToken,
}

impl AbortHandle {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

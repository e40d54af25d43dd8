use crate::errors::TransportError;
use crate::events::{ProgressEvent, TransportEvent};
use crate::net::{Blob, ResponseHead, Transport};
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Transport that replays a fixed list of events. It never touches the network and is
/// meant for tests and demos.
///
/// Every call to [`Transport::open`] queues the whole script at once and closes the
/// channel afterwards, unless [`ScriptedTransport::hold_open`] was used, in which case
/// the channel stays open so the transfer looks like it is hanging. A held channel is
/// released once its cancel token fires (checked on the next `open` and by
/// [`ScriptedTransport::release_cancelled`]).
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Vec<TransportEvent>,
    hold_open: bool,
    opened: Arc<AtomicUsize>,
    held: Arc<Mutex<Vec<(CancellationToken, mpsc::Sender<TransportEvent>)>>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = TransportEvent>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// A complete response delivered in a single chunk.
    pub fn respond(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let chunk = body.len().max(1);
        Self::respond_in_chunks(status, content_type, body, chunk)
    }

    /// A complete response whose body arrives in chunks of `chunk_size` bytes.
    pub fn respond_in_chunks(status: u16, content_type: &str, body: impl Into<Bytes>, chunk_size: usize) -> Self {
        let body = body.into();
        let total = body.len() as u64;

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(content_type) {
            if !content_type.is_empty() {
                headers.insert(CONTENT_TYPE, value);
            }
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(total));

        let mut script = vec![TransportEvent::Head(ResponseHead::new(status, headers))];
        let mut loaded = 0u64;
        for part in body.chunks(chunk_size.max(1)) {
            loaded += part.len() as u64;
            script.push(TransportEvent::Progress(ProgressEvent::new(loaded, Some(total))));
        }
        script.push(TransportEvent::Load(Blob::new(body, content_type)));

        Self::new(script)
    }

    /// A network failure before any response.
    pub fn fail(err: TransportError) -> Self {
        Self::new([TransportEvent::Error(err)])
    }

    /// A transfer that never reports anything.
    pub fn hanging() -> Self {
        Self::default().hold_open()
    }

    /// Keep the event channel open after the script has been queued.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Number of transfers opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of hanging transfers whose channel is still held open.
    pub fn held(&self) -> usize {
        self.held.lock().map(|held| held.len()).unwrap_or(0)
    }

    /// Drops the held channels of cancelled transfers. Returns how many were released.
    pub fn release_cancelled(&self) -> usize {
        let Ok(mut held) = self.held.lock() else {
            return 0;
        };
        let before = held.len();
        held.retain(|(cancel, _)| !cancel.is_cancelled());
        before - held.len()
    }
}

impl Transport for ScriptedTransport {
    fn open(&self, _url: &Url, cancel: CancellationToken) -> mpsc::Receiver<TransportEvent> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.release_cancelled();

        let (tx, rx) = mpsc::channel(self.script.len().max(1));
        for event in &self.script {
            // Capacity matches the script length, so this cannot fail on a full channel
            let _ = tx.try_send(event.clone());
        }

        if self.hold_open && !cancel.is_cancelled() {
            if let Ok(mut held) = self.held.lock() {
                held.push((cancel, tx));
            }
        }

        rx
    }
}

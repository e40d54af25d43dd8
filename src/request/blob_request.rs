use crate::config::RequestConfig;
use crate::errors::{ConfigError, FetchError, TransportError};
use crate::events::{ratio, ProgressEvent, TransportEvent};
use crate::expect::ExpectedType;
use crate::net::{Blob, ResponseHead, Transport};
use crate::request::handlers::{ErrorHandler, Handlers, ProgressHandler, RequestHandler, Slot};
use crate::request::structs::{AbortHandle, ActiveTransfer, RequestId, RequestState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A single binary GET transfer with progress and completion handlers.
///
/// The request owns one transport transfer and turns its events into handler calls and a
/// small read-only status surface. Events are dispatched serially by whoever owns the
/// request, through [`step`](Self::step), [`run`](Self::run) or
/// [`dispatch_pending`](Self::dispatch_pending). Handlers never run concurrently with each
/// other or with the owner's code.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use blobfetch::{BlobRequest, RequestConfig, ReqwestTransport, TransportConfig};
/// # async fn demo() -> Result<(), blobfetch::ConfigError> {
/// let transport = Arc::new(ReqwestTransport::new(TransportConfig::default())?);
/// let cfg = RequestConfig::builder()
///     .url("https://example.com/img.png")
///     .expect("image/png")
///     .on_success(|req| println!("{} bytes", req.bytes_loaded()))
///     .on_error(|_, e| eprintln!("failed: {e}"))
///     .build()?;
///
/// let mut req = BlobRequest::new(cfg, transport);
/// req.run().await;
/// # Ok(()) }
/// ```
pub struct BlobRequest {
    id: RequestId,
    url: Url,
    expect: Option<ExpectedType>,
    transport: Arc<dyn Transport>,
    handlers: Handlers,

    state: RequestState,
    bytes_loaded: u64,
    bytes_total: Option<u64>,
    progress: Option<f64>,
    completed: bool,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,

    head: Option<ResponseHead>,
    response: Option<Blob>,
    active: Option<ActiveTransfer>,
}

impl BlobRequest {
    /// Creates a request from `config`, starting it right away when `autostart` is set.
    pub fn new(config: RequestConfig, transport: Arc<dyn Transport>) -> Self {
        let (url, expect, autostart, handlers) = config.into_parts();

        let mut req = Self {
            id: RequestId::new(),
            url,
            expect,
            transport,
            handlers,
            state: RequestState::Idle,
            bytes_loaded: 0,
            bytes_total: None,
            progress: None,
            completed: false,
            started_at: None,
            finished_at: None,
            head: None,
            response: None,
            active: None,
        };

        if autostart {
            req.start();
        }
        req
    }

    /// Starts a GET for `url` right away with a success and an error handler.
    pub fn get<S, E>(
        url: &str,
        transport: Arc<dyn Transport>,
        on_success: S,
        on_error: E,
    ) -> Result<Self, ConfigError>
    where
        S: FnMut(&BlobRequest) + Send + 'static,
        E: FnMut(&BlobRequest, &FetchError) + Send + 'static,
    {
        let config = RequestConfig::builder()
            .url(url)
            .on_success(on_success)
            .on_error(on_error)
            .build()?;
        Ok(Self::new(config, transport))
    }

    /// Begins the transfer. Only the first call has an effect.
    pub fn start(&mut self) {
        if self.state != RequestState::Idle {
            log::debug!("BlobRequest[{}]: start() ignored in state {}", self.id, self.state);
            return;
        }

        let cancel = CancellationToken::new();
        let events = self.transport.open(&self.url, cancel.clone());

        self.started_at = Some(Instant::now());
        self.state = RequestState::Loading;
        self.active = Some(ActiveTransfer { events, cancel });

        log::debug!("BlobRequest[{}]: loading {}", self.id, self.url);
    }

    /// Cancels the in-flight transfer and runs the abort path. Does nothing unless loading.
    pub fn abort(&mut self) {
        if self.state != RequestState::Loading {
            log::debug!("BlobRequest[{}]: abort() ignored in state {}", self.id, self.state);
            return;
        }
        self.handle_abort();
    }

    /// A handle that can abort this request from another task. `None` unless loading.
    pub fn abort_handle(&self) -> Option<AbortHandle> {
        self.active.as_ref().map(|a| AbortHandle::new(a.cancel.clone()))
    }

    /// Waits for the next transport event and dispatches it.
    ///
    /// Returns `false` without waiting when the request is not loading.
    pub async fn step(&mut self) -> bool {
        if self.state != RequestState::Loading {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let event = tokio::select! {
            biased;
            _ = active.cancel.cancelled() => TransportEvent::Abort,
            ev = active.events.recv() => ev.unwrap_or(TransportEvent::Error(TransportError::Closed)),
        };

        self.dispatch(event);
        true
    }

    /// Pumps events until the request reaches a terminal state (or was never started).
    pub async fn run(&mut self) -> RequestState {
        while self.step().await {}
        self.state
    }

    /// Dispatches all events that are already queued, without waiting. Returns how many
    /// events were handled.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;

        while self.state == RequestState::Loading {
            let Some(active) = self.active.as_mut() else {
                break;
            };

            let event = if active.cancel.is_cancelled() {
                TransportEvent::Abort
            } else {
                match active.events.try_recv() {
                    Ok(ev) => ev,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => TransportEvent::Error(TransportError::Closed),
                }
            };

            self.dispatch(event);
            handled += 1;
        }

        handled
    }

    fn dispatch(&mut self, event: TransportEvent) {
        if self.state != RequestState::Loading {
            log::debug!("BlobRequest[{}]: dropping event in state {}", self.id, self.state);
            return;
        }

        match event {
            TransportEvent::Head(head) => {
                log::debug!("BlobRequest[{}]: response {} {}", self.id, head.status, head.status_text);
                self.head = Some(head);
            }
            TransportEvent::Progress(progress) => self.handle_progress(progress),
            TransportEvent::Load(blob) => self.handle_load(blob),
            TransportEvent::Error(err) => self.handle_error(err),
            TransportEvent::Abort => self.handle_abort(),
        }
    }

    fn handle_progress(&mut self, progress: ProgressEvent) {
        self.bytes_loaded = progress.loaded;

        // A known total never drops below what has been received
        if let Some(total) = progress.total.or(self.bytes_total) {
            let total = total.max(progress.loaded);
            self.bytes_total = Some(total);
            self.progress = Some(ratio(progress.loaded, total));
        }

        log::trace!(
            "BlobRequest[{}]: progress {}/{:?}",
            self.id,
            self.bytes_loaded,
            self.bytes_total
        );

        if let Some(mut handler) = self.handlers.on_progress.take() {
            handler(&*self, &progress);
            self.handlers.on_progress = Some(handler);
        }
    }

    fn handle_load(&mut self, blob: Blob) {
        let size = blob.size();
        self.progress = Some(1.0);
        self.bytes_loaded = size;
        self.bytes_total = Some(size);
        self.finished_at = Some(Instant::now());
        self.completed = true;
        self.active = None;

        let verdict = self.accept(&blob);
        self.response = Some(blob);

        match verdict {
            Ok(()) => {
                self.state = RequestState::Succeeded;
                log::debug!("BlobRequest[{}]: loaded {} bytes", self.id, size);
                self.notify(Slot::Success);
            }
            Err(err) => {
                self.state = RequestState::Failed;
                self.report_error(&err);
            }
        }

        self.notify(Slot::Load);
    }

    fn handle_error(&mut self, err: TransportError) {
        self.finished_at = Some(Instant::now());
        self.state = RequestState::Failed;
        self.active = None;
        self.report_error(&FetchError::Transport(err));
    }

    fn handle_abort(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
        self.finished_at = Some(Instant::now());
        self.state = RequestState::Aborted;

        if self.handlers.on_abort.is_some() {
            self.notify(Slot::Abort);
        } else {
            log::info!("BlobRequest[{}]: aborted {}", self.id, self.url);
        }
    }

    // Status must be 2xx and the content type must satisfy the expectation, if any
    fn accept(&self, blob: &Blob) -> Result<(), FetchError> {
        let (status, status_text) = match &self.head {
            Some(head) => (head.status, head.status_text.clone()),
            None => (0, String::new()),
        };
        if !(200..300).contains(&status) {
            return Err(FetchError::Status { status, status_text });
        }

        if let Some(expect) = &self.expect {
            if !expect.matches(blob.content_type()) {
                return Err(FetchError::TypeMismatch {
                    expected: expect.to_string(),
                    actual: blob.content_type().to_string(),
                });
            }
        }
        Ok(())
    }

    fn report_error(&mut self, err: &FetchError) {
        match self.handlers.on_error.take() {
            Some(mut handler) => {
                handler(&*self, err);
                self.handlers.on_error = Some(handler);
            }
            None => log::warn!("BlobRequest[{}]: blobfetch error for {}: {}", self.id, self.url, err),
        }
    }

    fn notify(&mut self, slot: Slot) {
        if let Some(mut handler) = self.handlers.slot(slot).take() {
            handler(&*self);
            *self.handlers.slot(slot) = Some(handler);
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Final URL of the response after redirects, falling back to the requested URL.
    pub fn response_url(&self) -> &Url {
        self.head.as_ref().and_then(|h| h.url.as_ref()).unwrap_or(&self.url)
    }

    pub fn expected_type(&self) -> Option<&ExpectedType> {
        self.expect.as_ref()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Fraction of the body received in `0.0..=1.0`, or `None` while the total is unknown.
    pub fn progress(&self) -> Option<f64> {
        self.progress
    }

    pub fn bytes_loaded(&self) -> u64 {
        self.bytes_loaded
    }

    /// Expected body size, or `None` while unknown.
    pub fn bytes_total(&self) -> Option<u64> {
        self.bytes_total
    }

    /// True once a response has completed, whether or not it was accepted.
    pub fn complete(&self) -> bool {
        self.completed
    }

    /// Time between start and the completed load. `None` after an error or abort.
    pub fn load_time(&self) -> Option<Duration> {
        if !self.completed {
            return None;
        }
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    /// The received body. Also set when the response was rejected by status or type.
    pub fn response(&self) -> Option<&Blob> {
        self.response.as_ref()
    }

    pub fn take_response(&mut self) -> Option<Blob> {
        self.response.take()
    }

    /// HTTP status, once the response head has arrived.
    pub fn status(&self) -> Option<u16> {
        self.head.as_ref().map(|h| h.status)
    }

    pub fn status_text(&self) -> Option<&str> {
        self.head.as_ref().map(|h| h.status_text.as_str())
    }

    pub fn response_head(&self) -> Option<&ResponseHead> {
        self.head.as_ref()
    }

    // Handler slots. Each setter returns the handler it replaced.

    pub fn set_on_load<F>(&mut self, f: F) -> Option<RequestHandler>
    where
        F: FnMut(&BlobRequest) + Send + 'static,
    {
        self.handlers.on_load.replace(Box::new(f))
    }

    pub fn set_on_success<F>(&mut self, f: F) -> Option<RequestHandler>
    where
        F: FnMut(&BlobRequest) + Send + 'static,
    {
        self.handlers.on_success.replace(Box::new(f))
    }

    pub fn set_on_error<F>(&mut self, f: F) -> Option<ErrorHandler>
    where
        F: FnMut(&BlobRequest, &FetchError) + Send + 'static,
    {
        self.handlers.on_error.replace(Box::new(f))
    }

    pub fn set_on_abort<F>(&mut self, f: F) -> Option<RequestHandler>
    where
        F: FnMut(&BlobRequest) + Send + 'static,
    {
        self.handlers.on_abort.replace(Box::new(f))
    }

    pub fn set_on_progress<F>(&mut self, f: F) -> Option<ProgressHandler>
    where
        F: FnMut(&BlobRequest, &ProgressEvent) + Send + 'static,
    {
        self.handlers.on_progress.replace(Box::new(f))
    }

    pub fn clear_on_load(&mut self) -> Option<RequestHandler> {
        self.handlers.on_load.take()
    }

    pub fn clear_on_success(&mut self) -> Option<RequestHandler> {
        self.handlers.on_success.take()
    }

    /// Without an error handler, failures are logged at warn level.
    pub fn clear_on_error(&mut self) -> Option<ErrorHandler> {
        self.handlers.on_error.take()
    }

    /// Without an abort handler, aborts are logged at info level.
    pub fn clear_on_abort(&mut self) -> Option<RequestHandler> {
        self.handlers.on_abort.take()
    }

    pub fn clear_on_progress(&mut self) -> Option<ProgressHandler> {
        self.handlers.on_progress.take()
    }

    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }
}

impl std::fmt::Debug for BlobRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobRequest")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .field("state", &self.state)
            .field("bytes_loaded", &self.bytes_loaded)
            .field("bytes_total", &self.bytes_total)
            .field("handlers", &self.handlers)
            .finish()
    }
}

impl Drop for BlobRequest {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

use crate::errors::FetchError;
use crate::events::ProgressEvent;
use crate::request::BlobRequest;
use std::fmt::{Debug, Formatter};

/// Handler called with the request after a lifecycle event (load, success, abort).
pub type RequestHandler = Box<dyn FnMut(&BlobRequest) + Send>;
/// Handler called with the request and the failure.
pub type ErrorHandler = Box<dyn FnMut(&BlobRequest, &FetchError) + Send>;
/// Handler called with the request and the progress report.
pub type ProgressHandler = Box<dyn FnMut(&BlobRequest, &ProgressEvent) + Send>;

/// The five single-slot handlers of a request. Assigning a slot replaces what was there.
#[derive(Default)]
pub struct Handlers {
    pub(crate) on_load: Option<RequestHandler>,
    pub(crate) on_success: Option<RequestHandler>,
    pub(crate) on_error: Option<ErrorHandler>,
    pub(crate) on_abort: Option<RequestHandler>,
    pub(crate) on_progress: Option<ProgressHandler>,
}

impl Debug for Handlers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("on_load", &self.on_load.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_abort", &self.on_abort.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Selects one of the [`RequestHandler`] slots.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    Load,
    Success,
    Abort,
}

impl Handlers {
    pub(crate) fn slot(&mut self, slot: Slot) -> &mut Option<RequestHandler> {
        match slot {
            Slot::Load => &mut self.on_load,
            Slot::Success => &mut self.on_success,
            Slot::Abort => &mut self.on_abort,
        }
    }
}

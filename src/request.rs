mod blob_request;
mod handlers;
mod structs;

pub use blob_request::BlobRequest;
pub use handlers::{ErrorHandler, Handlers, ProgressHandler, RequestHandler};
pub use structs::{AbortHandle, RequestId, RequestState};

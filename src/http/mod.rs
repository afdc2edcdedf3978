//! HTTP integration for request-scoped logging.
//!
//! # Data Flow
//! ```text
//! incoming request
//!     → request.rs (request ID, traceparent → LogContext)
//!     → access_log.rs (scope context, run handler, record outcome)
//!     → handler logs with the ambient context
//!     → response carries x-request-id back to the client
//! ```

pub mod access_log;
pub mod request;

pub use access_log::access_log;
pub use request::{context_from_headers, RequestId, TRACEPARENT, X_REQUEST_ID};

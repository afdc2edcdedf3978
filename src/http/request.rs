//! Request identification.
//!
//! # Responsibilities
//! - Reuse the caller's `x-request-id` or generate a UUID v4
//! - Extract W3C trace identifiers from `traceparent`
//! - Turn both into a [`LogContext`]
//!
//! # Design Decisions
//! - Request ID assigned as early as possible so every record carries it
//! - Oversized or non-ASCII request IDs are replaced, not trusted

use std::fmt;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::context::LogContext;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// W3C trace context header.
pub const TRACEPARENT: &str = "traceparent";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Identifier of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Take the caller-provided ID if present and sane, else generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
            .filter(|v| v.bytes().all(|b| b.is_ascii_graphic()))
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the log context for a request from its headers.
pub fn context_from_headers(headers: &HeaderMap, request_id: &RequestId) -> LogContext {
    let ctx = LogContext::new().with_request_id(request_id.as_str());
    match headers.get(TRACEPARENT).and_then(|v| v.to_str().ok()) {
        Some(traceparent) => ctx.with_traceparent(traceparent),
        None => ctx,
    }
}

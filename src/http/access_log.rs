//! Request-scoped logging middleware.
//!
//! # Responsibilities
//! - Assign the request ID and echo it on the response
//! - Make the request's [`LogContext`] ambient for the handler
//! - Record one access record per response
//!
//! # Design Decisions
//! - 5xx responses are recorded through `error` with the status as the
//!   causing error; 4xx through `warn`; everything else through `info`
//! - Latency is a duration field, so it renders in seconds

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::fields;
use crate::http::request::{context_from_headers, RequestId, X_REQUEST_ID};
use crate::logger::Logger;

/// Middleware function; install with `axum::middleware::from_fn_with_state`.
pub async fn access_log(
    State(logger): State<Arc<Logger>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = RequestId::from_headers(request.headers());
    let ctx = context_from_headers(request.headers(), &request_id);
    let header = HeaderValue::from_str(request_id.as_str()).ok();

    if let Some(value) = &header {
        request.headers_mut().insert(X_REQUEST_ID, value.clone());
    }
    request.extensions_mut().insert(ctx.clone());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let mut response = ctx.clone().scope(next.run(request)).await;

    if let Some(value) = header {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = response.status();
    let fields = fields![
        "method" => method,
        "path" => path,
        "status" => status.as_u16(),
        "latency" => start.elapsed(),
    ];
    if status.is_server_error() {
        logger.error(Some(&ctx), "request failed", Some(&status), fields);
    } else if status.is_client_error() {
        logger.warn(Some(&ctx), "request rejected", Some(&status), fields);
    } else {
        logger.info(Some(&ctx), "request completed", fields);
    }

    response
}

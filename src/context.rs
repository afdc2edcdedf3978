//! Request and trace context carried into log records.
//!
//! # Responsibilities
//! - Hold identifiers derived from the request being served
//! - Parse W3C `traceparent` values
//! - Provide a task-local ambient context for async handlers
//!
//! # Design Decisions
//! - Absence of a context is never an error; calls just carry fewer fields
//! - Context fields are appended after the caller's own fields

use std::future::Future;

use crate::record::{Field, Value};

tokio::task_local! {
    static CURRENT: LogContext;
}

/// Identifiers and extra fields attached to every record logged under it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContext {
    request_id: Option<String>,
    trace_id: Option<String>,
    span_id: Option<String>,
    extra: Vec<Field>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self.span_id = Some(span_id.into());
        self
    }

    /// Set trace identifiers from a W3C `traceparent` value; invalid values are ignored.
    #[must_use]
    pub fn with_traceparent(self, header: &str) -> Self {
        match parse_traceparent(header) {
            Some((trace_id, span_id)) => self.with_trace(trace_id, span_id),
            None => self,
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.push(Field::new(key, value));
        self
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn span_id(&self) -> Option<&str> {
        self.span_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.request_id.is_none() && self.trace_id.is_none() && self.extra.is_empty()
    }

    /// Append this context's fields to `fields`.
    pub fn append_to(&self, fields: &mut Vec<Field>) {
        if let Some(id) = &self.request_id {
            fields.push(Field::new("request_id", id.as_str()));
        }
        if let Some(id) = &self.trace_id {
            fields.push(Field::new("trace_id", id.as_str()));
        }
        if let Some(id) = &self.span_id {
            fields.push(Field::new("span_id", id.as_str()));
        }
        fields.extend(self.extra.iter().cloned());
    }

    /// Run `fut` with this context as the ambient context of the task.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    /// Run `f` synchronously with this context as the ambient context.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self, f)
    }

    /// The ambient context, if the caller runs inside a scope.
    pub fn current() -> Option<LogContext> {
        CURRENT.try_with(Clone::clone).ok()
    }
}

/// Split `00-<32 hex trace id>-<16 hex span id>-<2 hex flags>`.
pub fn parse_traceparent(header: &str) -> Option<(String, String)> {
    let mut parts = header.trim().split('-');
    let version = parts.next()?;
    let trace_id = parts.next()?;
    let span_id = parts.next()?;
    let flags = parts.next()?;

    let hex = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit());
    if !hex(version, 2) || version == "ff" || !hex(flags, 2) {
        return None;
    }
    if !hex(trace_id, 32) || !hex(span_id, 16) {
        return None;
    }
    if trace_id.bytes().all(|b| b == b'0') || span_id.bytes().all(|b| b == b'0') {
        return None;
    }
    Some((trace_id.to_ascii_lowercase(), span_id.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn test_traceparent_parsing() {
        let (trace, span) = parse_traceparent(TRACEPARENT).unwrap();
        assert_eq!(trace, "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(span, "00f067aa0ba902b7");

        assert!(parse_traceparent("garbage").is_none());
        assert!(parse_traceparent("00-00000000000000000000000000000000-00f067aa0ba902b7-01").is_none());
        assert!(parse_traceparent("ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01").is_none());
        assert!(parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e473-00f067aa0ba902b7-01").is_none());
    }

    #[test]
    fn test_fields_order() {
        let ctx = LogContext::new()
            .with_request_id("req-1")
            .with_traceparent(TRACEPARENT)
            .with_field("tenant", "acme");
        let mut fields = vec![Field::new("k", 1)];
        ctx.append_to(&mut fields);
        let keys: Vec<_> = fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["k", "request_id", "trace_id", "span_id", "tenant"]);
    }

    #[test]
    fn test_invalid_traceparent_is_ignored() {
        let ctx = LogContext::new().with_traceparent("nope");
        assert!(ctx.trace_id().is_none());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_sync_scope_exposes_current() {
        assert!(LogContext::current().is_none());
        let seen = LogContext::new()
            .with_request_id("abc")
            .sync_scope(|| LogContext::current().and_then(|c| c.request_id().map(str::to_string)));
        assert_eq!(seen.as_deref(), Some("abc"));
        assert!(LogContext::current().is_none());
    }

    #[tokio::test]
    async fn test_async_scope_exposes_current() {
        let ctx = LogContext::new().with_request_id("xyz");
        let seen = ctx
            .scope(async {
                tokio::task::yield_now().await;
                LogContext::current()
            })
            .await;
        assert_eq!(seen.and_then(|c| c.request_id().map(str::to_string)).as_deref(), Some("xyz"));
    }
}

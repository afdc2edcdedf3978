//! Logger facade and sink composition.
//!
//! # Data Flow
//! ```text
//! caller (message, optional error, fields, context)
//!     → error attached as `error` field
//!     → context fields merged
//!     → LogRecord
//!     → Encoder (once)
//!     → every sink whose filter admits the severity
//! ```
//!
//! # Design Decisions
//! - Building is all-or-nothing: any sink failure aborts construction and
//!   every cause is reported together
//! - A failed sink write never reaches the caller and never stops the
//!   other sinks; it is counted per sink and exported as a metric
//! - The logger is immutable once built and is shared behind `Arc`

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::context::LogContext;
use crate::encoder::{Encoder, Encoding};
use crate::error::{LogError, LogResult};
use crate::level::Severity;
use crate::record::{Field, LogRecord, ERROR_KEY};
use crate::rotation::{Clock, RotationPolicy, SystemClock};
use crate::sink::{Sink, SinkConfig};
use crate::INTERNAL_TARGET;

struct SinkSlot {
    sink: Box<dyn Sink>,
    faults: AtomicU64,
}

impl SinkSlot {
    fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("log_sink_write_failures_total", "sink" => self.sink.name()).increment(1);
    }
}

/// Fan-out logger over a fixed set of sinks.
pub struct Logger {
    sinks: Vec<SinkSlot>,
    encoder: Encoder,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sinks", &self.sink_names())
            .field("encoding", &self.encoder.encoding())
            .finish()
    }
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Record a debug message.
    ///
    /// Debug calls are recorded at `Info` severity, so they pass any filter
    /// that admits `Info`.
    pub fn debug(&self, ctx: Option<&LogContext>, message: &str, fields: Vec<Field>) {
        self.log(Severity::Info, ctx, message, None, fields);
    }

    pub fn info(&self, ctx: Option<&LogContext>, message: &str, fields: Vec<Field>) {
        self.log(Severity::Info, ctx, message, None, fields);
    }

    pub fn warn(
        &self,
        ctx: Option<&LogContext>,
        message: &str,
        err: Option<&dyn fmt::Display>,
        fields: Vec<Field>,
    ) {
        self.log(Severity::Warn, ctx, message, err, fields);
    }

    pub fn error(
        &self,
        ctx: Option<&LogContext>,
        message: &str,
        err: Option<&dyn fmt::Display>,
        fields: Vec<Field>,
    ) {
        self.log(Severity::Error, ctx, message, err, fields);
    }

    /// Record a fatal message. The process keeps running; terminating is
    /// up to the caller.
    pub fn fatal(
        &self,
        ctx: Option<&LogContext>,
        message: &str,
        err: Option<&dyn fmt::Display>,
        fields: Vec<Field>,
    ) {
        self.log(Severity::Fatal, ctx, message, err, fields);
    }

    /// Build a record and hand it to every admitting sink.
    ///
    /// With no explicit `ctx`, the task's ambient context is used if any.
    pub fn log(
        &self,
        severity: Severity,
        ctx: Option<&LogContext>,
        message: &str,
        err: Option<&dyn fmt::Display>,
        mut fields: Vec<Field>,
    ) {
        if !self.enabled(severity) {
            return;
        }

        if let Some(err) = err {
            fields.push(Field::new(ERROR_KEY, err.to_string()));
        }
        match ctx {
            Some(ctx) => ctx.append_to(&mut fields),
            None => {
                if let Some(ambient) = LogContext::current() {
                    ambient.append_to(&mut fields);
                }
            }
        }

        let record = LogRecord::new(self.clock.now(), severity, message, fields);
        self.submit(&record);
    }

    /// Encode `record` once and write it to every sink that admits it.
    pub fn submit(&self, record: &LogRecord) {
        let severity = record.severity();
        if !self.enabled(severity) {
            return;
        }
        metrics::counter!("log_records_total", "severity" => severity.as_str()).increment(1);

        let line = self.encoder.encode(record);
        for slot in self.sinks.iter().filter(|s| s.sink.admits(severity)) {
            if slot.sink.write(&line).is_err() {
                slot.record_fault();
            }
        }
    }

    /// True if at least one sink admits `severity`.
    pub fn enabled(&self, severity: Severity) -> bool {
        self.sinks.iter().any(|s| s.sink.admits(severity))
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.sink.name()).collect()
    }

    /// Write failures observed per sink, in sink order.
    pub fn sink_faults(&self) -> Vec<(&'static str, u64)> {
        self.sinks
            .iter()
            .map(|s| (s.sink.name(), s.faults.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn total_faults(&self) -> u64 {
        self.sinks.iter().map(|s| s.faults.load(Ordering::Relaxed)).sum()
    }

    /// Flush every sink; failures are counted like write failures.
    pub fn flush(&self) {
        for slot in &self.sinks {
            if slot.sink.flush().is_err() {
                slot.record_fault();
            }
        }
    }
}

/// Collects sink descriptions and builds a [`Logger`] atomically.
pub struct LoggerBuilder {
    configs: Vec<SinkConfig>,
    custom: Vec<Box<dyn Sink>>,
    encoding: Encoding,
    clock: Arc<dyn Clock>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            configs: Vec::new(),
            custom: Vec::new(),
            encoding: Encoding::default(),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn console(self, min_severity: Severity) -> Self {
        self.sink_config(SinkConfig::Console { min_severity })
    }

    /// Add a rotating file sink at `<directory>/<prefix>.<date>`.
    #[must_use]
    pub fn file(
        self,
        min_severity: Severity,
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        policy: RotationPolicy,
    ) -> Self {
        self.sink_config(SinkConfig::RotatingFile {
            min_severity,
            directory: directory.into(),
            prefix: prefix.into(),
            policy,
        })
    }

    #[must_use]
    pub fn sink_config(mut self, config: SinkConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Add an already constructed sink.
    #[must_use]
    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.custom.push(Box::new(sink));
        self
    }

    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bring every sink up, or fail with all the reasons none was kept.
    pub fn build(self) -> LogResult<Logger> {
        let mut sinks: Vec<Box<dyn Sink>> = Vec::with_capacity(self.configs.len() + self.custom.len());
        let mut errors = Vec::new();

        for config in &self.configs {
            match config.build(self.clock.clone()) {
                Ok(Some(sink)) => sinks.push(sink),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(LogError::Build(errors));
        }
        sinks.extend(self.custom);

        let logger = Logger {
            sinks: sinks
                .into_iter()
                .map(|sink| SinkSlot {
                    sink,
                    faults: AtomicU64::new(0),
                })
                .collect(),
            encoder: Encoder::new(self.encoding),
            clock: self.clock,
        };

        tracing::debug!(
            target: INTERNAL_TARGET,
            sinks = ?logger.sink_names(),
            encoding = ?self.encoding,
            "Logger built"
        );
        Ok(logger)
    }
}

//! Bridge from `tracing` events into a [`Logger`].
//!
//! Framework code that logs with `tracing::info!` and friends lands in the
//! same sinks, with the same layout, as direct logger calls. Events carrying
//! this crate's internal target are skipped so sink diagnostics can never
//! loop back into a sink.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::logger::Logger;
use crate::record::{Field, ERROR_KEY};
use crate::INTERNAL_TARGET;

/// A `tracing_subscriber` layer that forwards events to a logger.
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Arc<Logger>,
}

impl LoggerLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() == INTERNAL_TARGET {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let message = visitor.message.take().unwrap_or_default();
        let mut fields = visitor.fields;
        fields.push(Field::new("target", meta.target()));

        match *meta.level() {
            Level::ERROR => self.logger.error(None, &message, None, fields),
            Level::WARN => self.logger.warn(None, &message, None, fields),
            Level::INFO => self.logger.info(None, &message, fields),
            _ => self.logger.debug(None, &message, fields),
        }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<Field>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(Field::new(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_error(&mut self, _field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.fields.push(Field::new(ERROR_KEY, value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push(Field::new(field.name(), format!("{:?}", value)));
        }
    }
}

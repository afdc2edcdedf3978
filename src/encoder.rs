//! Record encoding.
//!
//! # Responsibilities
//! - Render a [`LogRecord`] into one newline-terminated line
//! - Keep a fixed field order: time, level, message, structured fields
//!
//! # Design Decisions
//! - One encoder instance is shared by every sink, so console and file
//!   output never diverge in field semantics
//! - Time is `YYYY-MM-DD HH:MM:SS.mmm` in the record's local offset
//! - Durations are rendered in seconds
//! - Structured fields travel as a single `args` object

use serde::{Deserialize, Serialize};

use crate::record::{Field, FieldMap, LogRecord};

/// Timestamp layout used by every encoding.
pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Output layout of an encoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Tab separated, human oriented.
    #[default]
    Console,
    /// One JSON object per line.
    Json,
}

#[derive(Serialize)]
struct Args<'a> {
    args: FieldMap<'a>,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    time: String,
    level: &'static str,
    msg: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    args: FieldMap<'a>,
}

fn is_empty(fields: &FieldMap<'_>) -> bool {
    fields.0.is_empty()
}

/// Deterministic renderer shared by all sinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    encoding: Encoding,
}

impl Encoder {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Encode a record into a single line, including the trailing newline.
    pub fn encode(&self, record: &LogRecord) -> Vec<u8> {
        let mut line = match self.encoding {
            Encoding::Console => encode_console(record),
            Encoding::Json => encode_json(record),
        };
        line.push('\n');
        line.into_bytes()
    }
}

fn encode_console(record: &LogRecord) -> String {
    let mut line = format!(
        "{}\t{}\t{}",
        record.timestamp().format(TIME_LAYOUT),
        record.severity(),
        escape_line_breaks(record.message()),
    );
    if !record.fields().is_empty() {
        line.push('\t');
        line.push_str(&fields_json(record.fields()));
    }
    line
}

fn encode_json(record: &LogRecord) -> String {
    let line = JsonLine {
        time: record.timestamp().format(TIME_LAYOUT).to_string(),
        level: record.severity().as_str(),
        msg: record.message(),
        args: FieldMap(record.fields()),
    };
    // Field keys are strings and values are plain scalars, so this cannot fail.
    serde_json::to_string(&line).unwrap_or_default()
}

fn fields_json(fields: &[Field]) -> String {
    serde_json::to_string(&Args {
        args: FieldMap(fields),
    })
    .unwrap_or_default()
}

/// A console line must stay a single line.
fn escape_line_breaks(message: &str) -> std::borrow::Cow<'_, str> {
    if message.contains(['\n', '\r']) {
        message.replace('\r', "\\r").replace('\n', "\\n").into()
    } else {
        message.into()
    }
}

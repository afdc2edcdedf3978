//! Log destinations.
//!
//! # Responsibilities
//! - Define the capability set every destination offers: a severity filter
//!   and a line writer
//! - Provide the console and rotating-file destinations
//!
//! # Design Decisions
//! - Each sink serializes access to its own stream; sinks share no lock,
//!   so a slow disk never stalls console writers
//! - A record is written with a single `write_all` under the sink lock,
//!   so lines never interleave

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::LogResult;
use crate::level::Severity;
use crate::rotation::{Clock, RotatingWriter, RotationPolicy};

/// A destination for encoded log records.
pub trait Sink: Send + Sync + fmt::Debug {
    /// Short label used in fault counters and metrics.
    fn name(&self) -> &'static str;

    fn min_severity(&self) -> Severity;

    fn admits(&self, severity: Severity) -> bool {
        severity.admitted_by(self.min_severity())
    }

    /// Write one encoded, newline-terminated record.
    fn write(&self, line: &[u8]) -> io::Result<()>;

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Declarative description of a sink, resolved by the logger builder.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkConfig {
    Console {
        min_severity: Severity,
    },
    RotatingFile {
        min_severity: Severity,
        directory: PathBuf,
        prefix: String,
        policy: RotationPolicy,
    },
}

impl SinkConfig {
    /// Build the sink, or `None` for a file sink without a path prefix.
    pub fn build(&self, clock: Arc<dyn Clock>) -> LogResult<Option<Box<dyn Sink>>> {
        match self {
            SinkConfig::Console { min_severity } => Ok(Some(Box::new(ConsoleSink::stdout(*min_severity)))),
            SinkConfig::RotatingFile {
                min_severity,
                directory,
                prefix,
                policy,
            } => {
                if directory.as_os_str().is_empty() || prefix.is_empty() {
                    return Ok(None);
                }
                let writer = RotatingWriter::new(directory.clone(), prefix.clone(), *policy, clock)?;
                Ok(Some(Box::new(FileSink::new(*min_severity, writer))))
            }
        }
    }
}

/// Writes records to stdout, or to any injected writer.
pub struct ConsoleSink {
    min_severity: Severity,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stdout(min_severity: Severity) -> Self {
        Self::with_writer(min_severity, io::stdout())
    }

    pub fn with_writer(min_severity: Severity, writer: impl Write + Send + 'static) -> Self {
        Self {
            min_severity,
            out: Mutex::new(Box::new(writer)),
        }
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn min_severity(&self) -> Severity {
        self.min_severity
    }

    fn write(&self, line: &[u8]) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(line)?;
        out.flush()
    }

    fn flush(&self) -> io::Result<()> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}

/// Writes records to a time-rotated file.
#[derive(Debug)]
pub struct FileSink {
    min_severity: Severity,
    writer: RotatingWriter,
}

impl FileSink {
    pub fn new(min_severity: Severity, writer: RotatingWriter) -> Self {
        Self {
            min_severity,
            writer,
        }
    }

    pub fn current_path(&self) -> PathBuf {
        self.writer.current_path()
    }
}

impl Sink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn min_severity(&self) -> Severity {
        self.min_severity
    }

    fn write(&self, line: &[u8]) -> io::Result<()> {
        self.writer.write_record(line)
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.flush()
    }
}

//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Defaults match `init_logger`: console on, `.logs` directory, seven
//! retained daily files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encoder::Encoding;
use crate::error::LogResult;
use crate::level::Severity;
use crate::logger::LoggerBuilder;
use crate::rotation::{Clock, RotationPolicy, SystemClock};
use crate::sink::SinkConfig;

/// Root configuration for the logger.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Application name, used as the log file prefix.
    pub name_prefix: String,

    /// Verbosity 0..=6; higher means more detail.
    pub verbosity: i32,

    /// Line layout shared by every sink.
    pub encoding: Encoding,

    /// Console sink settings.
    pub console: ConsoleConfig,

    /// Rotating file sink settings.
    pub file: FileConfig,

    /// Metrics exporter settings.
    pub metrics: MetricsConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name_prefix: "app".to_string(),
            verbosity: 4,
            encoding: Encoding::Console,
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Console sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Write records to stdout.
    pub enabled: bool,

    /// Per-sink verbosity override.
    pub verbosity: Option<i32>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            verbosity: None,
        }
    }
}

/// File sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    /// Directory for rotated files; empty disables the file sink.
    pub location: String,

    /// Number of files kept, the active one included.
    pub rotation_count: usize,

    /// Rotation interval in hours.
    pub rotation_hours: u64,

    /// Per-sink verbosity override.
    pub verbosity: Option<i32>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            location: ".logs".to_string(),
            rotation_count: 7,
            rotation_hours: 24,
            verbosity: None,
        }
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter.
    pub enabled: bool,

    /// Exporter bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:9100".to_string(),
        }
    }
}

impl LoggerConfig {
    /// The configuration `init_logger(name_prefix, verbosity)` uses.
    pub fn new(name_prefix: impl Into<String>, verbosity: i32) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            verbosity,
            ..Self::default()
        }
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy {
            interval: Duration::from_secs(self.file.rotation_hours.saturating_mul(3600)),
            max_retained: self.file.rotation_count,
        }
    }

    /// Resolve the requested sinks. Fails on any out-of-range verbosity.
    pub fn sink_configs(&self) -> LogResult<Vec<SinkConfig>> {
        let mut sinks = Vec::new();

        if self.console.enabled {
            let verbosity = self.console.verbosity.unwrap_or(self.verbosity);
            sinks.push(SinkConfig::Console {
                min_severity: Severity::from_verbosity(verbosity)?,
            });
        }

        if !self.file.location.is_empty() {
            let verbosity = self.file.verbosity.unwrap_or(self.verbosity);
            sinks.push(SinkConfig::RotatingFile {
                min_severity: Severity::from_verbosity(verbosity)?,
                directory: PathBuf::from(&self.file.location),
                prefix: self.name_prefix.clone(),
                policy: self.rotation_policy(),
            });
        }

        Ok(sinks)
    }

    /// A builder preloaded with this configuration's sinks and encoding.
    pub fn builder(&self) -> LogResult<LoggerBuilder> {
        self.builder_with_clock(Arc::new(SystemClock))
    }

    pub fn builder_with_clock(&self, clock: Arc<dyn Clock>) -> LogResult<LoggerBuilder> {
        // An invalid global verbosity is rejected even if every sink overrides it.
        Severity::from_verbosity(self.verbosity)?;

        let builder = self
            .sink_configs()?
            .into_iter()
            .fold(LoggerBuilder::new(), LoggerBuilder::sink_config);
        Ok(builder.encoding(self.encoding).clock(clock))
    }
}

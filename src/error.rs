//! Error definitions for the logging subsystem.
//!
//! # Taxonomy
//! - Configuration errors surface synchronously from logger construction.
//! - Sink write errors never leave a log call; they are counted instead
//!   (see [`crate::logger::Logger::sink_faults`]).
//! - Misuse (logging before initialization) is a defined error.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Errors produced while building or using a logger.
#[derive(Debug, Error)]
pub enum LogError {
    /// Verbosity outside the accepted 0..=6 range.
    #[error("invalid verbosity {0}: expected a value between 0 and 6")]
    InvalidVerbosity(i32),

    /// A sink could not open or create its destination.
    #[error("cannot open log destination {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more sinks failed to come up; no logger was produced.
    #[error("failed to build logger: {}", join_errors(.0))]
    Build(Vec<LogError>),

    /// The process-wide logger was used before `init_logger`.
    #[error("logger not initialized")]
    NotInitialized,

    /// The configuration file could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for logger construction and global-handle operations.
pub type LogResult<T> = Result<T, LogError>;

fn join_errors(errors: &[LogError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

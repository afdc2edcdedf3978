//! Process-wide logger handle and convenience functions.
//!
//! # Design Decisions
//! - The handle lives in an `ArcSwapOption`: reads are lock-free and a
//!   second initialization replaces the first (last writer wins)
//! - A failed initialization leaves any previous handle untouched
//! - Using the free functions before initialization returns
//!   [`LogError::NotInitialized`]; it never panics

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::{validate_config, ConfigError, LoggerConfig};
use crate::error::{LogError, LogResult};
use crate::logger::Logger;
use crate::record::Field;
use crate::INTERNAL_TARGET;

static GLOBAL: ArcSwapOption<Logger> = ArcSwapOption::const_empty();

/// Initialize the process-wide logger with the default sinks: console,
/// plus daily files under `.logs/<name_prefix>.<date>` keeping seven files.
pub fn init_logger(name_prefix: &str, verbosity: i32) -> LogResult<()> {
    let logger = LoggerConfig::new(name_prefix, verbosity).builder()?.build()?;
    install(logger);
    Ok(())
}

/// Validate `config` and initialize the process-wide logger from it.
pub fn init_with_config(config: &LoggerConfig) -> LogResult<()> {
    validate_config(config).map_err(|errors| LogError::Config(ConfigError::Validation(errors)))?;
    let logger = config.builder()?.build()?;
    install(logger);
    Ok(())
}

/// Make `logger` the process-wide handle, replacing any previous one.
pub fn install(logger: Logger) -> Arc<Logger> {
    let logger = Arc::new(logger);
    let previous = GLOBAL.swap(Some(logger.clone()));
    if previous.is_some() {
        tracing::warn!(target: INTERNAL_TARGET, "Process-wide logger replaced");
    }
    logger
}

/// The process-wide logger.
pub fn global() -> LogResult<Arc<Logger>> {
    GLOBAL.load_full().ok_or(LogError::NotInitialized)
}

pub fn is_initialized() -> bool {
    GLOBAL.load().is_some()
}

/// Record a debug message (recorded at `Info` severity).
pub fn debug(message: &str, fields: Vec<Field>) -> LogResult<()> {
    global()?.debug(None, message, fields);
    Ok(())
}

pub fn info(message: &str, fields: Vec<Field>) -> LogResult<()> {
    global()?.info(None, message, fields);
    Ok(())
}

pub fn warn(message: &str, err: Option<&dyn fmt::Display>, fields: Vec<Field>) -> LogResult<()> {
    global()?.warn(None, message, err, fields);
    Ok(())
}

pub fn error(message: &str, err: Option<&dyn fmt::Display>, fields: Vec<Field>) -> LogResult<()> {
    global()?.error(None, message, err, fields);
    Ok(())
}

/// Record a fatal message. Does not terminate the process.
pub fn fatal(message: &str, err: Option<&dyn fmt::Display>, fields: Vec<Field>) -> LogResult<()> {
    global()?.fatal(None, message, err, fields);
    Ok(())
}

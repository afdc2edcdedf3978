//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (verbosity, rotation settings)
//! - Reject file prefixes that would escape the log directory
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LoggerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::LoggerConfig;
use crate::level::Severity;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint and report all violations.
pub fn validate_config(config: &LoggerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_verbosity(&mut errors, "verbosity", Some(config.verbosity));
    check_verbosity(&mut errors, "console.verbosity", config.console.verbosity);
    check_verbosity(&mut errors, "file.verbosity", config.file.verbosity);

    if config.name_prefix.is_empty() {
        errors.push(ValidationError::new("name_prefix", "must not be empty"));
    } else if config.name_prefix.contains(['/', '\\']) || config.name_prefix == ".." {
        errors.push(ValidationError::new(
            "name_prefix",
            format!("'{}' must not contain path separators", config.name_prefix),
        ));
    }

    if !config.file.location.is_empty() {
        if config.file.rotation_hours == 0 {
            errors.push(ValidationError::new("file.rotation_hours", "must be greater than 0"));
        }
        if config.file.rotation_count == 0 {
            errors.push(ValidationError::new("file.rotation_count", "must be greater than 0"));
        }
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "metrics.address",
            format!("'{}' is not a socket address", config.metrics.address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_verbosity(errors: &mut Vec<ValidationError>, field: &'static str, verbosity: Option<i32>) {
    if let Some(v) = verbosity {
        if Severity::from_verbosity(v).is_err() {
            errors.push(ValidationError::new(field, format!("{} is outside 0..=6", v)));
        }
    }
}

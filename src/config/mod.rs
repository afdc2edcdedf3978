//! Logger configuration.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LoggerConfig (validated, immutable)
//!     → LoggerConfig::builder() → Logger
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; sinks and filters are fixed for the
//!   lifetime of the logger
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ConsoleConfig, FileConfig, LoggerConfig, MetricsConfig};
pub use validation::{validate_config, ValidationError};

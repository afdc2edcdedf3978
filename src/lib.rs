//! Leveled, multi-sink structured logging.
//!
//! # Data Flow
//!
//! ```text
//!   facade call (debug/info/warn/error/fatal)
//!        │  message + error + fields + LogContext
//!        ▼
//!   ┌──────────┐    ┌─────────┐    ┌───────────────────────────────┐
//!   │  logger  │───▶│ encoder │───▶│ sinks (each filters by level) │
//!   └──────────┘    └─────────┘    │  ├─ console (stdout)          │
//!        ▲                         │  └─ file ── rotation          │
//!        │                         └───────────────────────────────┘
//!   global / bridge / http
//! ```
//!
//! - `global` holds the process-wide handle behind `init_logger`
//! - `bridge` forwards `tracing` events into a logger
//! - `http` attaches request context to every record of a request

// Core pipeline
pub mod encoder;
pub mod level;
pub mod logger;
pub mod record;
pub mod rotation;
pub mod sink;

// Context and entry points
pub mod bridge;
pub mod context;
pub mod global;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod testing;

pub use bridge::LoggerLayer;
pub use config::LoggerConfig;
pub use context::LogContext;
pub use encoder::Encoding;
pub use error::{LogError, LogResult};
pub use global::{init_logger, init_with_config};
pub use level::Severity;
pub use logger::{Logger, LoggerBuilder};
pub use record::{Field, LogRecord, Value};
pub use rotation::RotationPolicy;

/// `tracing` target of the crate's own diagnostics. The bridge drops
/// events with this target.
pub const INTERNAL_TARGET: &str = "mixin_log::internal";

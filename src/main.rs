//! mixin-log command line.
//!
//! - `serve`: minimal axum app with request-scoped logging and `/health`
//! - `emit`: write a single record through the configured sinks
//! - `check`: load and validate a config file

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use mixin_log::config::{load_config, validate_config, LoggerConfig};
use mixin_log::http::access_log;
use mixin_log::{global, Field, LogContext, Logger, LoggerLayer, Severity, INTERNAL_TARGET};

#[derive(Parser)]
#[command(name = "mixin-log")]
#[command(about = "Leveled multi-sink structured logger", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `name_prefix`
    #[arg(long)]
    prefix: Option<String>,

    /// Override `verbosity` (0..=6)
    #[arg(short, long)]
    verbosity: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a demo app that logs every request
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
    /// Write one record
    Emit {
        /// Severity as verbosity: 0 panic ... 6 debug
        #[arg(short, long, default_value_t = 4)]
        level: i32,

        message: String,

        /// Attach an error
        #[arg(short, long)]
        error: Option<String>,

        /// Extra field as key=value; repeatable
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Validate the configuration and print it
    Check,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LoggerConfig::default(),
    };
    if let Some(prefix) = cli.prefix {
        config.name_prefix = prefix;
    }
    if let Some(verbosity) = cli.verbosity {
        config.verbosity = verbosity;
    }

    if let Commands::Check = cli.command {
        return match validate_config(&config) {
            Ok(()) => {
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            Err(errors) => {
                for error in &errors {
                    eprintln!("invalid: {}", error);
                }
                Err(format!("{} validation error(s)", errors.len()).into())
            }
        };
    }

    mixin_log::init_with_config(&config)?;
    let logger = global::global()?;

    // Own diagnostics go to stderr; everything else reaches the sinks.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter::filter_fn(|meta| meta.target() == INTERNAL_TARGET)),
        )
        .with(LoggerLayer::new(logger.clone()))
        .init();

    if config.metrics.enabled {
        let addr: SocketAddr = config.metrics.address.parse()?;
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        tracing::info!(address = %addr, "Metrics exporter listening");
    }

    match cli.command {
        Commands::Serve { bind } => serve(logger.clone(), &bind).await?,
        Commands::Emit {
            level,
            message,
            error,
            fields,
        } => {
            let severity = Severity::from_verbosity(level)?;
            let fields = fields
                .into_iter()
                .map(|(key, value)| Field::new(key, value))
                .collect();
            let err = error.as_ref().map(|e| e as &dyn std::fmt::Display);
            logger.log(severity, None, &message, err, fields);
        }
        Commands::Check => {}
    }

    logger.flush();
    Ok(())
}

async fn serve(logger: Arc<Logger>, bind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = Router::new()
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(logger, access_log));

    let listener = TcpListener::bind(bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    let request_id = LogContext::current().and_then(|ctx| ctx.request_id().map(str::to_string));
    Json(json!({ "status": "ok", "request_id": request_id }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: INTERNAL_TARGET, error = %e, "Failed to listen for Ctrl+C");
    }
    tracing::info!("Shutdown signal received");
}

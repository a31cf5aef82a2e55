//! Tracing subscriber setup.
//!
//! Two layers: every DEBUG event goes to a plain-text log file, while the
//! console shows INFO (DEBUG with `--debug`). `RUST_LOG` replaces the console
//! filter. HTTP library chatter stays at WARN in both.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Targets held at WARN regardless of level.
const QUIET_TARGETS: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn";

/// Console and file logging options.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Show DEBUG on the console
    pub debug: bool,
    /// Console output as JSON lines
    pub json: bool,
    /// File receiving the full log, appended to
    pub log_file: &'a Path,
}

fn console_directives(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("{},{}", level, QUIET_TARGETS)
}

/// Install the global subscriber.
pub fn init_logging(config: LoggingConfig<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_filter(EnvFilter::try_new(format!("debug,{}", QUIET_TARGETS))?);

    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(console_directives(config.debug)))?;
    let console_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer.with_filter(console_filter))
        .try_init()?;

    Ok(())
}

//! Logging initialization.
//!
//! Human-readable or JSON output on stderr, or appended to a log file.

use crate::config::LoggingConfig;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Flushes the file writer on exit; must live for the whole program
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber.
pub fn init_telemetry(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.level)?;

    if let Some(path) = &config.file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);

        let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
        if config.json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .try_init()?;
        } else {
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }

        let _ = LOG_GUARD.set(guard);
    } else if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod dicomweb;
pub mod error;
pub mod monitoring;
pub mod pipeline;
pub mod redaction;
pub mod relay;
pub mod router;

use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::{Error, Result};

/// Install the global subscriber: stdout always, plus a file when configured.
/// `RUST_LOG` takes precedence over `proxy.log_level`.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.proxy.log_level))
        .map_err(|e| Error::Config(format!("invalid log level: {}", e)))?;

    let file_layer = if config.logging.log_to_file {
        let file = File::create(&config.logging.log_file_path)?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
    } else {
        None
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to initialize logging: {}", e)))?;

    tracing::info!("🔧 Starting DICOM adapter '{}'", config.proxy.id);
    Ok(())
}

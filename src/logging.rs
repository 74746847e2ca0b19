// ABOUTME: Tracing subscriber setup, constructed by the binary at startup
// ABOUTME: stderr output filtered by RUST_LOG, optional append-only log file

use crate::{Error, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Dated log file name in the current directory.
pub fn default_log_file() -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    PathBuf::from(format!("md2canvas_{}.log", today))
}

pub fn init(log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Setup(format!("failed to initialize logging: {}", e)))?;

    tracing::debug!("starting logging at {}", chrono::Local::now());
    Ok(())
}

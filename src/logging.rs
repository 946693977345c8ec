use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::{Interface, SmartCabConfig};

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// The form owns the terminal, so its logs go to a file.
    File(PathBuf),
}

impl LogTarget {
    pub fn for_config(config: &SmartCabConfig, log_dir: PathBuf) -> Self {
        match config.ui.interface {
            Interface::Prompt => LogTarget::Stderr,
            Interface::Form => LogTarget::File(log_dir.join("smartcab.log")),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &SmartCabConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let log_dir = SmartCabConfig::config_dir()?;

    match LogTarget::for_config(config, log_dir) {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_level(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init()
        }
    }
    Ok(())
}

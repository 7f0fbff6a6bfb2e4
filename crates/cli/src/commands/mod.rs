pub mod chat;
pub mod config;
pub mod doctor;

use std::path::PathBuf;

use anyhow::{Context, Result};

use opsroute_core::config::{AppConfig, LoadOptions};

/// An explicitly passed path must exist; the default search locations
/// are optional.
pub(crate) fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let require_file = config_path.is_some();
    AppConfig::load(LoadOptions { config_path, require_file, ..LoadOptions::default() })
        .context("loading configuration")
}

pub(crate) fn init_logging(config: &AppConfig) {
    use opsroute_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

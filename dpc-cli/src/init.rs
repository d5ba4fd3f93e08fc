use std::path::PathBuf;

use common::log_setup::{setup_logging, LogConfig};

pub fn init(log_level: &str, log_dir: Option<PathBuf>) {
    let config = match log_dir {
        Some(directory) => LogConfig {
            base_level: log_level.to_string(),
            directory: Some(directory),
            ..LogConfig::default()
        },
        None => LogConfig::console_only(log_level),
    };
    setup_logging(&config);
}

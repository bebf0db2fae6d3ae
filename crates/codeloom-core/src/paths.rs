//! Centralized path utilities

use std::path::PathBuf;

use crate::constants::paths;

/// Get the codeloom config directory (~/.codeloom)
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(paths::CONFIG_DIR_NAME)
}

/// ~/.codeloom/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join(paths::CONFIG_FILE_NAME)
}

/// Get the logs directory (~/.codeloom/logs)
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure the logs directory exists, creating it if necessary
pub fn ensure_logs_dir() -> std::io::Result<PathBuf> {
    let dir = logs_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

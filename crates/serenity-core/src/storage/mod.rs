mod config;
pub mod database;

pub use config::{ApiConfig, Config, NotificationsConfig, TimerConfig};
pub use database::{DailySummary, Database, ProfileStats, SessionRecord};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/serenity[-dev]/` based on SERENITY_ENV.
///
/// Set SERENITY_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SERENITY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("serenity-dev")
    } else {
        base_dir.join("serenity")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

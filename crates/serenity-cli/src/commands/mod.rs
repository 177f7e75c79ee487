pub mod auth;
pub mod config;
pub mod history;
pub mod settings;
pub mod sounds;
pub mod timer;

use std::sync::Arc;

use serenity_core::{ApiClient, Config, KeyringTokenStore};

/// Client for the configured backend, authenticated from the OS keyring.
pub(crate) fn api_client(config: &Config) -> Result<ApiClient, Box<dyn std::error::Error>> {
    Ok(ApiClient::from_config(
        &config.api,
        Arc::new(KeyringTokenStore::new()),
    )?)
}

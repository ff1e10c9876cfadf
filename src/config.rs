// Application settings, loaded with the 'config' crate and 'dotenv'

use anyhow::{ensure, Context, Result};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::time::Duration;

use crate::session::MAX_PAGE_WINDOW_SIZE;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server_address: String,
    // Base URL of the search service; requests go to `{search_api_url}/search`
    pub search_api_url: String,
    pub page_window_size: u32,
    pub request_timeout_secs: u64,
    pub proxy_url: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Self::with_defaults()?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., CARCHAT_SEARCH_API_URL)
            .add_source(Environment::with_prefix("CARCHAT").try_parsing(true));

        Self::from_config(builder.build()?)
    }

    fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("search_api_url", "http://127.0.0.1:8000")?
            .set_default("page_window_size", 5)?
            .set_default("request_timeout_secs", 30)?)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let settings: Settings = config
            .try_deserialize()
            .context("Failed to deserialize settings")?;
        ensure!(
            (1..=MAX_PAGE_WINDOW_SIZE).contains(&settings.page_window_size),
            "page_window_size must be between 1 and {}",
            MAX_PAGE_WINDOW_SIZE
        );
        ensure!(!settings.search_api_url.trim().is_empty(), "search_api_url must not be empty");
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

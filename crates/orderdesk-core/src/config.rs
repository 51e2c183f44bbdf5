//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL, the last used username, the token storage
//! backend and the colour theme.
//!
//! Configuration is stored at `~/.config/orderdesk/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileTokenStorage, KeyringTokenStorage, TokenStorage};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "orderdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "ORDERDESK_API_URL";

/// Environment variable pre-filling the login username
pub const USERNAME_ENV: &str = "ORDERDESK_USERNAME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorageKind {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub last_username: Option<String>,
    pub token_storage: TokenStorageKind,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            last_username: None,
            token_storage: TokenStorageKind::default(),
            theme: Theme::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the log file
    pub fn log_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend URL to connect to: `ORDERDESK_API_URL` when set and non-empty,
    /// otherwise `api_base_url`. The override is never saved.
    pub fn effective_api_url(&self) -> String {
        self.api_url_with(std::env::var(API_URL_ENV).ok().as_deref())
    }

    fn api_url_with(&self, override_url: Option<&str>) -> String {
        match override_url.map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.api_base_url.clone(),
        }
    }

    /// Username to pre-fill: the environment first, then the last login
    pub fn initial_username(&self) -> Option<String> {
        std::env::var(USERNAME_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.last_username.clone())
    }

    /// Build the configured token storage backend
    pub fn build_storage(&self) -> Result<Arc<dyn TokenStorage>> {
        Ok(match self.token_storage {
            TokenStorageKind::File => Arc::new(FileTokenStorage::new(FileTokenStorage::default_path()?)),
            TokenStorageKind::Keyring => Arc::new(KeyringTokenStorage::new()),
        })
    }
}

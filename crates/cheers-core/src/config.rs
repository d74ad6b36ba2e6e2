//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, where session tokens are stored, and
//! the last phone number used to sign in.
//!
//! Configuration is stored at `~/.config/cheers/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, DEFAULT_API_BASE_URL};
use crate::store::keychain::DEFAULT_SERVICE_NAME;
use crate::store::{FileStore, KeychainStore, MemoryStore, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "cheers";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where session tokens are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// OS keychain (Keychain, Credential Manager, Secret Service)
    #[default]
    Keyring,
    /// Owner-only JSON file in the data directory
    File,
    /// Nothing persisted across runs
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub keyring_service: Option<String>,
    /// Unset means the HTTP client's defaults apply
    pub request_timeout_secs: Option<u64>,
    pub last_phone: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn keyring_service(&self) -> &str {
        self.keyring_service.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        let client = match self.request_timeout_secs {
            Some(secs) => ApiClient::with_timeout(self.api_base_url(), Duration::from_secs(secs)),
            None => ApiClient::new(self.api_base_url()),
        };
        client.context("Failed to build HTTP client")
    }

    /// Open the configured token store.
    pub fn open_store(&self) -> Result<Box<dyn TokenStore>> {
        Ok(match self.storage {
            StorageBackend::Keyring => Box::new(KeychainStore::new(self.keyring_service())),
            StorageBackend::File => Box::new(FileStore::new(self.data_dir()?)),
            StorageBackend::Memory => Box::new(MemoryStore::new()),
        })
    }
}

use crate::tariff::TariffRates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "energy-bill";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub tariff: TariffRates,
    #[serde(default)]
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_account_id")]
    pub account_id: String,
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
    /// Day downloads can be slow on the portal side
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://portal-api.1stenergy.com.au".to_string()
}

fn default_account_id() -> String {
    "410151".to_string()
}

fn default_auth_timeout_secs() -> u64 {
    60
}

fn default_download_timeout_secs() -> u64 {
    60 * 60
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            account_id: default_account_id(),
            auth_timeout_secs: default_auth_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
        }
    }
}

/// Locations of the login credentials and the cached bearer token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<PathBuf>,
}

impl FilesConfig {
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials
            .clone()
            .unwrap_or_else(|| app_dir().join("credentials.json"))
    }

    pub fn token_path(&self) -> PathBuf {
        self.token
            .clone()
            .unwrap_or_else(|| app_dir().join("token.txt"))
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    pub fn config_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

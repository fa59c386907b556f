use crate::config::FilesConfig;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::path::PathBuf;

/// Login credentials and the bearer token cached between runs
#[derive(Debug, Clone)]
pub struct TokenStore {
    credentials_path: PathBuf,
    token_path: PathBuf,
}

impl TokenStore {
    pub fn new(credentials_path: PathBuf, token_path: PathBuf) -> Self {
        Self {
            credentials_path,
            token_path,
        }
    }

    pub fn from_config(files: &FilesConfig) -> Self {
        Self::new(files.credentials_path(), files.token_path())
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials_path.is_file()
    }

    /// Credential fields are portal specific and forwarded untouched.
    pub fn load_credentials(&self) -> Result<Value> {
        let path = &self.credentials_path;
        if !path.exists() {
            return Err(anyhow!(
                "Portal credentials not found at {}.",
                path.display()
            ));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials JSON in {}", path.display()))
    }

    pub fn load_token(&self) -> Result<String> {
        let path = &self.token_path;
        let content = std::fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read cached token {}. Run `energy-bill login` first.",
                path.display()
            )
        })?;
        Ok(content.trim_end().to_string())
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        let path = &self.token_path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, token)?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to store token in {}", path.display()))?;

        Ok(())
    }
}

// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;

pub const DEFAULT_API_URL: &str = "https://journal-app-backend-kxqs.onrender.com";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

// Two backend revisions disagree on this path (`/user` vs `/user/delete`).
fn default_delete_account_path() -> String {
    "/user".to_string()
}

fn default_delete_entry_path() -> String {
    "/journal/{id}".to_string()
}

fn default_user_agent() -> String {
    format!("daybook/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where user-facing notices (the "toasts") end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Desktop,
    None,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_delete_account_path")]
    pub delete_account_path: String,
    /// `{id}` is replaced by the entry id.
    #[serde(default = "default_delete_entry_path")]
    pub delete_entry_path: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub notifications: NotifierKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            delete_account_path: default_delete_account_path(),
            delete_entry_path: default_delete_entry_path(),
            user_agent: default_user_agent(),
            log_level: default_log_level(),
            notifications: NotifierKind::default(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Load the configuration, falling back to defaults when the file does not exist.
    /// Parse errors are still reported.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(cfg) => Ok(cfg),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Detects whether an error means the config file was missing, either through
    /// our explicit message or an underlying IO NotFound anywhere in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }
}

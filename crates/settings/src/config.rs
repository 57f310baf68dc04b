//! Configuration types

use std::path::{Path, PathBuf};
use std::time::Duration;

use flowcraft_core::{ContractAddresses, NetworkDefinition, DEFAULT_TOKEN_DECIMALS};
use flowcraft_keystore::{default_key_path, expand_path};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Target network
    #[serde(default)]
    pub network: NetworkDefinition,

    /// Deployed contract addresses
    #[serde(default)]
    pub contracts: ContractAddresses,

    #[serde(default)]
    pub wallet: WalletSettings,

    #[serde(default)]
    pub execution: ExecutionSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            info!("Loaded settings from {:?}", path);
            settings
        } else {
            Self::default()
        };
        settings.config_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Save settings to the configured path
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// How transactions get signed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletMode {
    /// In-memory chain, nothing leaves the process
    #[default]
    Mock,
    /// JSON-RPC against the configured network with a local key
    Live,
}

/// Wallet settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSettings {
    #[serde(default)]
    pub mode: WalletMode,

    /// Operator key file; `~/.flowcraft/operator.key` when unset
    #[serde(default)]
    pub keyfile: Option<String>,
}

impl WalletSettings {
    /// Resolved key file location
    pub fn key_path(&self) -> PathBuf {
        self.keyfile
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(default_key_path)
    }
}

/// Execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Decimals of the reward token
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,

    /// Receipt poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

fn default_token_decimals() -> u8 {
    DEFAULT_TOKEN_DECIMALS
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            token_decimals: default_token_decimals(),
            receipt_poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ExecutionSettings {
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

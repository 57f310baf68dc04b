//! FlowCraft Settings
//!
//! Operator configuration for FlowCraft apps.
//!
//! ## Features
//!
//! - Target network (chain id, RPC and explorer URLs)
//! - Contract addresses (macro forwarder, rewards macro)
//! - Wallet mode (mock or live) and key file
//! - Execution tuning (token decimals, receipt polling)
//!
//! ## Usage
//!
//! ```no_run
//! use flowcraft_settings::{Settings, WalletMode};
//!
//! let mut settings = Settings::load_or_default()?;
//! settings.wallet.mode = WalletMode::Live;
//! settings.save()?;
//! # Ok::<(), flowcraft_settings::SettingsError>(())
//! ```

mod config;

pub use config::{ExecutionSettings, Settings, WalletMode, WalletSettings};

use std::path::PathBuf;

use flowcraft_keystore::default_config_dir;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

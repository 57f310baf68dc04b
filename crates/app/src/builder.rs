//! App builder for fluent initialization

use std::path::PathBuf;
use std::sync::Arc;

use flowcraft_keystore::expand_path;
use flowcraft_logging::{try_init as try_init_logging, LogLevel};
use flowcraft_settings::{Settings, WalletMode};

use crate::{App, Result};

/// Builder for creating FlowCraft applications
pub struct AppBuilder {
    name: Option<String>,
    version: Option<String>,
    verbose: bool,
    log_level: Option<LogLevel>,
    config_path: Option<PathBuf>,
    mock: Option<bool>,
    keyfile: Option<String>,
    skip_logging: bool,
    skip_settings: bool,
    skip_banner: bool,
}

impl AppBuilder {
    /// Create a new app builder
    pub fn new() -> Self {
        Self {
            name: None,
            version: None,
            verbose: false,
            log_level: None,
            config_path: None,
            mock: None,
            keyfile: None,
            skip_logging: false,
            skip_settings: false,
            skip_banner: false,
        }
    }

    /// Set the application name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the application version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Enable verbose logging (debug level)
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set explicit log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set custom config path
    pub fn config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Force mock (`true`) or live (`false`) wallet mode over the settings
    pub fn mock(mut self, mock: bool) -> Self {
        self.mock = Some(mock);
        self
    }

    /// Override the operator key file
    pub fn keyfile(mut self, path: impl Into<String>) -> Self {
        self.keyfile = Some(path.into());
        self
    }

    /// Skip logging initialization (useful for tests)
    pub fn skip_logging(mut self) -> Self {
        self.skip_logging = true;
        self
    }

    /// Skip settings loading
    pub fn skip_settings(mut self) -> Self {
        self.skip_settings = true;
        self
    }

    /// Skip startup banner
    pub fn skip_banner(mut self) -> Self {
        self.skip_banner = true;
        self
    }

    /// Build the application
    pub fn build(self) -> Result<App> {
        let name = self.name.unwrap_or_else(|| "flowcraft".to_string());
        let version = self.version.unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        if !self.skip_logging {
            let level = self.log_level.unwrap_or(if self.verbose {
                LogLevel::Debug
            } else {
                LogLevel::Info
            });

            // Try to initialize, ignore if already initialized
            let _ = try_init_logging(level);
        }

        let settings = if self.skip_settings {
            Settings::default()
        } else if let Some(path) = self.config_path {
            Settings::load_from(&path)?
        } else {
            Settings::load_or_default()?
        };

        let wallet_mode = match self.mock {
            Some(true) => WalletMode::Mock,
            Some(false) => WalletMode::Live,
            None => settings.wallet.mode,
        };
        let key_path = match self.keyfile {
            Some(path) => expand_path(&path),
            None => settings.wallet.key_path(),
        };

        let app = App {
            name,
            version,
            settings: Arc::new(settings),
            wallet_mode,
            key_path,
        };

        if !self.skip_banner && !self.skip_logging {
            app.log_startup();
        }

        Ok(app)
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

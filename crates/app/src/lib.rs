//! FlowCraft App Framework
//!
//! Standard initialization for FlowCraft applications: logging, settings
//! and the chain backend selected by the wallet mode.
//!
//! ## Usage
//!
//! ```no_run
//! use flowcraft_app::App;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::builder()
//!         .name("flowcraft")
//!         .mock(true)
//!         .verbose(true)
//!         .build()?;
//!
//!     let controller = app.controller()?;
//!     Ok(())
//! }
//! ```

mod builder;

pub use builder::AppBuilder;

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use thiserror::Error;
use tracing::info;

use flowcraft_client::DistributionController;
use flowcraft_keystore::{load_or_generate_signer, KeystoreError};
use flowcraft_settings::{Settings, WalletMode};
use flowcraft_settlement::{ChainError, MockChain, RpcChain, RpcConfig};

/// Operator account of the mock wallet
pub const MOCK_OPERATOR: Address = address!("0000000000000000000000000000000000f10c4a");

/// Pool the mock chain knows about
pub const MOCK_POOL: Address = address!("00000000000000000000000000000000000b0001");

/// Reward token streamed by [`MOCK_POOL`]
pub const MOCK_TOKEN: Address = address!("00000000000000000000000000000000000b0002");

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    #[error("Settings error: {0}")]
    Settings(#[from] flowcraft_settings::SettingsError),

    #[error("Keystore error: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Initialized FlowCraft application
pub struct App {
    name: String,
    version: String,
    settings: Arc<Settings>,
    wallet_mode: WalletMode,
    key_path: PathBuf,
}

impl App {
    /// Create a new app builder
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.clone()
    }

    /// Wallet mode after command-line overrides
    pub fn wallet_mode(&self) -> WalletMode {
        self.wallet_mode
    }

    pub fn key_path(&self) -> &PathBuf {
        &self.key_path
    }

    /// In-memory chain seeded with [`MOCK_POOL`] and a funded [`MOCK_OPERATOR`].
    pub fn mock_chain(&self) -> Arc<MockChain> {
        let chain = MockChain::new(self.settings.network.chain_id, self.settings.contracts);
        chain.add_account(MOCK_OPERATOR);
        chain.add_pool(MOCK_POOL, MOCK_TOKEN);
        let one_token = U256::from(10u64).pow(U256::from(self.settings.execution.token_decimals));
        chain.set_balance(MOCK_TOKEN, MOCK_OPERATOR, one_token * U256::from(1_000u64));
        Arc::new(chain)
    }

    /// JSON-RPC chain for the configured network, signing with the operator key.
    pub fn rpc_chain(&self) -> Result<Arc<RpcChain>> {
        let rpc_url = self
            .settings
            .network
            .rpc_urls
            .first()
            .cloned()
            .ok_or_else(|| AppError::InvalidConfig("network has no RPC URL".to_string()))?;
        let signer = load_or_generate_signer(&self.key_path)?;
        let config = RpcConfig {
            rpc_url,
            receipt_poll_interval: self.settings.execution.receipt_poll_interval(),
        };
        Ok(Arc::new(RpcChain::new(config, Some(signer))?))
    }

    /// Distribution controller over the backend selected by the wallet mode.
    pub fn controller(&self) -> Result<DistributionController> {
        let network = self.settings.network.clone();
        let contracts = self.settings.contracts;
        let controller = match self.wallet_mode {
            WalletMode::Mock => DistributionController::new(self.mock_chain(), network, contracts),
            WalletMode::Live => DistributionController::new(self.rpc_chain()?, network, contracts),
        };
        Ok(controller.with_token_decimals(self.settings.execution.token_decimals))
    }

    /// Log startup banner
    pub fn log_startup(&self) {
        info!("╔════════════════════════════════════════╗");
        info!("║          FlowCraft {:^10}          ║", self.version);
        info!("╠════════════════════════════════════════╣");
        info!("║  App: {:<32} ║", self.name);
        info!("║  Network: {:<28} ║", self.settings.network.name);
        info!("║  Wallet: {:<29} ║", format!("{:?}", self.wallet_mode));
        info!("╚════════════════════════════════════════╝");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcraft_client::Phase;

    fn mock_app() -> App {
        App::builder()
            .skip_logging()
            .skip_settings()
            .skip_banner()
            .mock(true)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_mock_controller_validates_seeded_pool() {
        let controller = mock_app().controller().unwrap();
        controller.connect().await.unwrap();

        let inspection = controller
            .set_pool_address(&MOCK_POOL.to_string())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(inspection.token, Some(MOCK_TOKEN));
        assert_eq!(controller.snapshot().phase, Phase::PoolValid);
    }

    #[test]
    fn test_mock_operator_is_funded() {
        let app = mock_app();
        let chain = app.mock_chain();
        assert!(chain.distribution(MOCK_POOL).is_none());
        assert_eq!(
            flowcraft_settlement::ChainWriter::signer_address(chain.as_ref()),
            Some(MOCK_OPERATOR)
        );
    }
}

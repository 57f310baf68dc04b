//! FlowCraft Settlement
//!
//! EVM client side of the reward-stream distribution pipeline.
//!
//! ## Distribution Flow
//!
//! 1. **Inspect**: read `superToken()` from the pool. A pool that answers
//!    is valid; its token is then queried for the operator's balance.
//! 2. **Derive params**: call `getParams(pool, recipients, units, flowRate)`
//!    on the rewards macro. The returned bytes are opaque.
//! 3. **Run macro**: send `runMacro(rewardsMacro, params)` to the macro
//!    forwarder, which updates member units and starts the flow in one
//!    transaction.
//! 4. **Confirm**: poll for the receipt. A reverted receipt is reported,
//!    never resubmitted.
//!
//! Chain access goes through the [`ChainReader`], [`ChainWriter`] and
//! [`NetworkProvider`] traits. [`RpcChain`] talks JSON-RPC to a live node;
//! [`MockChain`] keeps everything in memory for development and tests.

pub mod abi;
mod executor;
mod inspector;
mod mock;
mod network;
mod params;
mod rpc;
mod traits;

pub use executor::MacroExecutor;
pub use inspector::PoolInspector;
pub use mock::{AppliedDistribution, MockChain, MockTransaction};
pub use network::switch_to_network;
pub use params::ParameterBuilder;
pub use rpc::{RpcChain, RpcConfig};
pub use traits::{ChainReader, ChainWriter, NetworkProvider};

use thiserror::Error;

/// EIP-1193 code for a request the user declined
pub const USER_REJECTED: i64 = 4001;

/// EIP-1193 code for a chain the wallet does not know
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Call reverted: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Reverted { reason: Option<String> },

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("No signing key configured")]
    NoSigner,

    #[error("Wallet error {code}: {message}")]
    Wallet { code: i64, message: String },
}

impl ChainError {
    pub fn reverted(reason: impl Into<String>) -> Self {
        Self::Reverted { reason: Some(reason.into()) }
    }

    pub fn wallet_code(&self) -> Option<i64> {
        match self {
            Self::Wallet { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverted_display() {
        assert_eq!(
            ChainError::reverted("length mismatch").to_string(),
            "Call reverted: length mismatch"
        );
        assert_eq!(
            ChainError::Reverted { reason: None }.to_string(),
            "Call reverted: no reason given"
        );
    }

    #[test]
    fn test_wallet_code() {
        let err = ChainError::Wallet { code: UNRECOGNIZED_CHAIN, message: "unknown".into() };
        assert_eq!(err.wallet_code(), Some(UNRECOGNIZED_CHAIN));
        assert_eq!(ChainError::NoSigner.wallet_code(), None);
    }
}

//! Chain capabilities consumed by the pipeline.
//!
//! Components depend on these traits rather than on a transport so the
//! same code drives a live node or the in-memory mock.

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use flowcraft_core::{NetworkDefinition, TransactionReceipt};

use crate::Result;

/// Read-only contract calls (`eth_call` against the latest block).
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Execute a call without creating a transaction and return its raw output.
    async fn call(&self, from: Option<Address>, to: Address, input: Bytes) -> Result<Bytes>;
}

/// Signed transaction submission.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Address transactions are signed from, if a signer is available.
    fn signer_address(&self) -> Option<Address>;

    /// Sign and broadcast a call to `to`. Returns once the node accepted it.
    async fn submit(&self, to: Address, input: Bytes) -> Result<TxHash>;

    /// Wait until `tx_hash` is included and return its receipt.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt>;
}

/// Wallet connection and network identity.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    async fn chain_id(&self) -> Result<u64>;

    /// Ask the wallet to move to a chain it already knows.
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// Register a chain with the wallet and move to it.
    async fn add_chain(&self, network: &NetworkDefinition) -> Result<()>;
}

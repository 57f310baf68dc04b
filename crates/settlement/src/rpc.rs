//! JSON-RPC chain access for live mode.
//!
//! Reads go through `eth_call`. Writes are EIP-1559 transactions signed
//! locally with the operator key and broadcast raw; the node never sees
//! the key. The "wallet" side (accounts, chain switching) is emulated on
//! top of the same client: the signer is the only account, and switching
//! chains swaps the endpoint.

use std::collections::HashMap;
use std::time::Duration;

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_json_rpc::ErrorPayload;
use alloy_primitives::{Address, Bytes, TxHash, TxKind, U256, U64};
use alloy_rpc_client::{ClientBuilder, ReqwestClient};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::TransportError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use flowcraft_core::{NetworkDefinition, TransactionReceipt};

use crate::abi::revert_reason;
use crate::{ChainError, ChainReader, ChainWriter, NetworkProvider, Result, UNRECOGNIZED_CHAIN};

/// Gas estimate headroom, in percent of the estimate
const GAS_HEADROOM_PERCENT: u64 = 120;

/// Live chain configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// JSON-RPC endpoint of the target network
    pub rpc_url: String,
    /// Delay between `eth_getTransactionReceipt` polls
    pub receipt_poll_interval: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://sepolia.optimism.io".to_string(),
            receipt_poll_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    to: Address,
    data: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    block_number: Option<U64>,
    gas_used: U64,
    status: Option<U64>,
}

impl From<RpcReceipt> for TransactionReceipt {
    fn from(r: RpcReceipt) -> Self {
        Self {
            tx_hash: r.transaction_hash,
            block_number: r.block_number.map(|n| n.to::<u64>()),
            gas_used: r.gas_used.to::<u64>(),
            success: r.status == Some(U64::from(1)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockFees {
    base_fee_per_gas: Option<U256>,
}

/// Chain access over HTTP JSON-RPC
pub struct RpcChain {
    client: RwLock<ReqwestClient>,
    /// chain id -> endpoint, for chains registered through `add_chain`
    endpoints: RwLock<HashMap<u64, Url>>,
    signer: Option<PrivateKeySigner>,
    poll_interval: Duration,
}

impl RpcChain {
    pub fn new(config: RpcConfig, signer: Option<PrivateKeySigner>) -> Result<Self> {
        let url = parse_url(&config.rpc_url)?;
        info!("Using JSON-RPC endpoint {}", url);

        Ok(Self {
            client: RwLock::new(ClientBuilder::default().http(url)),
            endpoints: RwLock::new(HashMap::new()),
            signer,
            poll_interval: config.receipt_poll_interval,
        })
    }

    fn client(&self) -> ReqwestClient {
        self.client.read().clone()
    }

    async fn fetch_chain_id(client: &ReqwestClient) -> Result<u64> {
        let id = client
            .request_noparams::<U64>("eth_chainId")
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_chainId: {}", e)))?;
        Ok(id.to::<u64>())
    }

    /// Current EIP-1559 fees as (max fee, priority fee)
    async fn fees(&self, client: &ReqwestClient) -> Result<(u128, u128)> {
        let priority = client
            .request_noparams::<U256>("eth_maxPriorityFeePerGas")
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_maxPriorityFeePerGas: {}", e)))?;
        let block = client
            .request::<_, Option<BlockFees>>("eth_getBlockByNumber", ("latest", false))
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_getBlockByNumber: {}", e)))?;

        let base = block
            .and_then(|b| b.base_fee_per_gas)
            .unwrap_or(U256::ZERO)
            .saturating_to::<u128>();
        let priority = priority.saturating_to::<u128>();
        Ok((base.saturating_mul(2).saturating_add(priority), priority))
    }
}

fn parse_url(text: &str) -> Result<Url> {
    Url::parse(text).map_err(|e| ChainError::Rpc(format!("invalid RPC URL '{}': {}", text, e)))
}

fn gas_limit_with_headroom(estimate: u64) -> u64 {
    estimate.saturating_mul(GAS_HEADROOM_PERCENT) / 100
}

/// Map a failed `eth_call`/`eth_estimateGas`, keeping revert reasons.
fn call_error(e: TransportError) -> ChainError {
    match e.as_error_resp() {
        Some(payload) => payload_error(payload),
        None => ChainError::Rpc(e.to_string()),
    }
}

fn payload_error(payload: &ErrorPayload) -> ChainError {
    if let Some(data) = payload.as_revert_data() {
        return ChainError::Reverted { reason: revert_reason(&data) };
    }
    if payload.message.contains("revert") {
        return ChainError::reverted(payload.message.to_string());
    }
    ChainError::Rpc(format!("{} (code {})", payload.message, payload.code))
}

#[async_trait]
impl ChainReader for RpcChain {
    async fn call(&self, from: Option<Address>, to: Address, input: Bytes) -> Result<Bytes> {
        let request = CallRequest { from, to, data: input };
        debug!("eth_call to {}", to);
        self.client()
            .request::<_, Bytes>("eth_call", (request, "latest"))
            .await
            .map_err(call_error)
    }
}

#[async_trait]
impl ChainWriter for RpcChain {
    fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn submit(&self, to: Address, input: Bytes) -> Result<TxHash> {
        let signer = self.signer.as_ref().ok_or(ChainError::NoSigner)?;
        let from = signer.address();
        let client = self.client();

        let chain_id = Self::fetch_chain_id(&client).await?;
        let nonce = client
            .request::<_, U64>("eth_getTransactionCount", (from, "pending"))
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_getTransactionCount: {}", e)))?
            .to::<u64>();

        let estimate_request = CallRequest { from: Some(from), to, data: input.clone() };
        let estimate = client
            .request::<_, U64>("eth_estimateGas", (estimate_request,))
            .await
            .map_err(|e| ChainError::Rejected(call_error(e).to_string()))?
            .to::<u64>();

        let (max_fee_per_gas, max_priority_fee_per_gas) = self.fees(&client).await?;

        let tx = TxEip1559 {
            chain_id,
            nonce,
            gas_limit: gas_limit_with_headroom(estimate),
            max_fee_per_gas,
            max_priority_fee_per_gas,
            to: TxKind::Call(to),
            value: U256::ZERO,
            access_list: Default::default(),
            input,
        };

        let signature = signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| ChainError::Rejected(format!("signing failed: {}", e)))?;
        let envelope = TxEnvelope::Eip1559(tx.into_signed(signature));

        let mut raw = Vec::new();
        envelope.encode_2718(&mut raw);

        let hash = client
            .request::<_, TxHash>("eth_sendRawTransaction", (Bytes::from(raw),))
            .await
            .map_err(|e| ChainError::Rejected(call_error(e).to_string()))?;

        info!(
            "Broadcast transaction {} (nonce {}, gas limit {})",
            hash,
            nonce,
            gas_limit_with_headroom(estimate)
        );
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        let client = self.client();
        loop {
            let receipt = client
                .request::<_, Option<RpcReceipt>>("eth_getTransactionReceipt", (tx_hash,))
                .await
                .map_err(|e| ChainError::Rpc(format!("eth_getTransactionReceipt: {}", e)))?;

            if let Some(receipt) = receipt {
                return Ok(receipt.into());
            }
            debug!("Transaction {} not yet included", tx_hash);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl NetworkProvider for RpcChain {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.signer_address()
            .map(|a| vec![a])
            .ok_or(ChainError::NoSigner)
    }

    async fn chain_id(&self) -> Result<u64> {
        Self::fetch_chain_id(&self.client()).await
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        if self.chain_id().await? == chain_id {
            return Ok(());
        }

        let endpoint = self.endpoints.read().get(&chain_id).cloned();
        match endpoint {
            Some(url) => {
                info!("Switching RPC endpoint to {}", url);
                *self.client.write() = ClientBuilder::default().http(url);
                Ok(())
            }
            None => Err(ChainError::Wallet {
                code: UNRECOGNIZED_CHAIN,
                message: format!("Unrecognized chain ID {:#x}", chain_id),
            }),
        }
    }

    async fn add_chain(&self, network: &NetworkDefinition) -> Result<()> {
        let Some(first) = network.rpc_urls.first() else {
            return Err(ChainError::Rpc(format!("{} has no RPC URL", network.name)));
        };
        let url = parse_url(first)?;
        let client = ClientBuilder::default().http(url.clone());

        let reported = Self::fetch_chain_id(&client).await?;
        if reported != network.chain_id {
            warn!("{} reports chain {} instead of {}", url, reported, network.chain_id);
            return Err(ChainError::Rpc(format!(
                "{} serves chain {} instead of {}",
                url, reported, network.chain_id
            )));
        }

        self.endpoints.write().insert(network.chain_id, url);
        *self.client.write() = client;
        info!("Added network {} ({})", network.name, network.chain_id_hex());
        Ok(())
    }
}

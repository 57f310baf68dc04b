//! In-memory chain for development and tests.
//!
//! Mirrors the handful of contracts the pipeline touches: pools answer
//! `superToken()`, tokens answer `balanceOf`, the rewards macro echoes its
//! own calldata back as the params blob and the forwarder applies it.
//! Everything else returns empty output, like calling an EOA.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::aliases::I96;
use alloy_primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tracing::debug;

use flowcraft_core::{ContractAddresses, NetworkDefinition, TransactionReceipt, UnitWeight};

use crate::abi::{IMacroForwarder, IRewardsMacro, ISuperToken, ISuperfluidPool};
use crate::{
    ChainError, ChainReader, ChainWriter, NetworkProvider, Result, UNRECOGNIZED_CHAIN,
    USER_REJECTED,
};

/// Member units and flow rate the forwarder last applied to a pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDistribution {
    pub members: Vec<(Address, UnitWeight)>,
    pub flow_rate: I96,
}

/// A transaction accepted by the mock, reverted or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub success: bool,
}

#[derive(Debug, Default)]
struct MockState {
    chain_id: u64,
    known_chains: HashSet<u64>,
    accounts: Vec<Address>,
    reject_wallet: bool,
    /// pool -> reward token
    pools: HashMap<Address, Address>,
    /// (token, holder) -> balance
    balances: HashMap<(Address, Address), U256>,
    distributions: HashMap<Address, AppliedDistribution>,
    transactions: Vec<MockTransaction>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    get_params_revert: Option<String>,
    next_submission_failure: Option<String>,
    revert_next_execution: bool,
    block_number: u64,
    tx_counter: u64,
}

/// Chain simulator implementing every chain capability
pub struct MockChain {
    contracts: ContractAddresses,
    state: RwLock<MockState>,
    call_count: Mutex<usize>,
    pool_latches: Mutex<HashMap<Address, Arc<Notify>>>,
    submission_latch: Mutex<Option<Arc<Notify>>>,
}

impl MockChain {
    pub fn new(chain_id: u64, contracts: ContractAddresses) -> Self {
        let state = MockState {
            chain_id,
            known_chains: HashSet::from([chain_id]),
            ..Default::default()
        };
        Self {
            contracts,
            state: RwLock::new(state),
            call_count: Mutex::new(0),
            pool_latches: Mutex::new(HashMap::new()),
            submission_latch: Mutex::new(None),
        }
    }

    /// Add a wallet account. The first one signs transactions.
    pub fn add_account(&self, account: Address) {
        self.state.write().accounts.push(account);
    }

    pub fn add_pool(&self, pool: Address, token: Address) {
        self.state.write().pools.insert(pool, token);
    }

    pub fn set_balance(&self, token: Address, holder: Address, balance: U256) {
        self.state.write().balances.insert((token, holder), balance);
    }

    /// Move the wallet to another chain, as if the user did it out of band.
    pub fn set_chain_id(&self, chain_id: u64) {
        let mut state = self.state.write();
        state.known_chains.insert(chain_id);
        state.chain_id = chain_id;
    }

    pub fn add_known_chain(&self, chain_id: u64) {
        self.state.write().known_chains.insert(chain_id);
    }

    /// Make every wallet prompt fail with a user rejection.
    pub fn reject_wallet_requests(&self, reject: bool) {
        self.state.write().reject_wallet = reject;
    }

    /// Make `getParams` revert with `reason` until cleared.
    pub fn revert_get_params(&self, reason: impl Into<String>) {
        self.state.write().get_params_revert = Some(reason.into());
    }

    /// Refuse the next submission before it reaches the chain.
    pub fn fail_next_submission(&self, reason: impl Into<String>) {
        self.state.write().next_submission_failure = Some(reason.into());
    }

    /// Include the next transaction but revert it.
    pub fn revert_next_execution(&self) {
        self.state.write().revert_next_execution = true;
    }

    /// Park the next `superToken()` call on `pool` until the latch is notified.
    pub fn hold_pool(&self, pool: Address) -> Arc<Notify> {
        let latch = Arc::new(Notify::new());
        self.pool_latches.lock().insert(pool, latch.clone());
        latch
    }

    /// Park the next submission until the latch is notified.
    pub fn hold_next_submission(&self) -> Arc<Notify> {
        let latch = Arc::new(Notify::new());
        *self.submission_latch.lock() = Some(latch.clone());
        latch
    }

    /// Number of `eth_call`s served so far
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    pub fn transactions(&self) -> Vec<MockTransaction> {
        self.state.read().transactions.clone()
    }

    pub fn distribution(&self, pool: Address) -> Option<AppliedDistribution> {
        self.state.read().distributions.get(&pool).cloned()
    }

    fn wallet_check(state: &MockState) -> Result<()> {
        if state.reject_wallet {
            return Err(ChainError::Wallet {
                code: USER_REJECTED,
                message: "User rejected the request".to_string(),
            });
        }
        Ok(())
    }

    fn generate_mock_hash(state: &mut MockState) -> TxHash {
        state.tx_counter += 1;
        let mut seed = Vec::with_capacity(16);
        seed.extend_from_slice(&state.tx_counter.to_le_bytes());
        seed.extend_from_slice(b"mocktxn!");
        keccak256(seed)
    }

    fn serve_call(&self, to: Address, input: &[u8]) -> Result<Bytes> {
        let state = self.state.read();
        let selector = input.get(..4).unwrap_or_default();

        if to == self.contracts.rewards_macro
            && selector == IRewardsMacro::getParamsCall::SELECTOR
        {
            if let Some(reason) = &state.get_params_revert {
                return Err(ChainError::reverted(reason.clone()));
            }
            let call = IRewardsMacro::getParamsCall::abi_decode(input, true)
                .map_err(|e| ChainError::reverted(format!("bad getParams input: {}", e)))?;
            if call.recipients.len() != call.units.len() {
                return Err(ChainError::reverted("recipients and units length mismatch"));
            }
            let blob = Bytes::copy_from_slice(input);
            return Ok(IRewardsMacro::getParamsCall::abi_encode_returns(&(blob,)).into());
        }

        if let Some(token) = state.pools.get(&to) {
            if selector == ISuperfluidPool::superTokenCall::SELECTOR {
                return Ok(ISuperfluidPool::superTokenCall::abi_encode_returns(&(*token,)).into());
            }
        }

        let is_token = state.pools.values().any(|t| *t == to)
            || state.balances.keys().any(|(t, _)| *t == to);
        if is_token && selector == ISuperToken::balanceOfCall::SELECTOR {
            let call = ISuperToken::balanceOfCall::abi_decode(input, true)
                .map_err(|e| ChainError::reverted(format!("bad balanceOf input: {}", e)))?;
            let balance = state
                .balances
                .get(&(to, call.account))
                .copied()
                .unwrap_or(U256::ZERO);
            return Ok(ISuperToken::balanceOfCall::abi_encode_returns(&(balance,)).into());
        }

        Ok(Bytes::new())
    }

    /// Apply a forwarded macro; `None` means the transaction reverts.
    fn apply_macro(
        &self,
        state: &MockState,
        to: Address,
        input: &[u8],
    ) -> Option<(Address, AppliedDistribution)> {
        if to != self.contracts.macro_forwarder {
            return None;
        }
        let run = IMacroForwarder::runMacroCall::abi_decode(input, true).ok()?;
        if run.m != self.contracts.rewards_macro {
            return None;
        }
        let params = IRewardsMacro::getParamsCall::abi_decode(&run.params, true).ok()?;
        if !state.pools.contains_key(&params.pool) {
            return None;
        }
        let members = params.recipients.into_iter().zip(params.units).collect();
        Some((params.pool, AppliedDistribution { members, flow_rate: params.flowRate }))
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn call(&self, _from: Option<Address>, to: Address, input: Bytes) -> Result<Bytes> {
        *self.call_count.lock() += 1;

        if input.get(..4) == Some(&ISuperfluidPool::superTokenCall::SELECTOR[..]) {
            let latch = self.pool_latches.lock().remove(&to);
            if let Some(latch) = latch {
                debug!("Holding superToken() on {}", to);
                latch.notified().await;
            }
        }

        self.serve_call(to, &input)
    }
}

#[async_trait]
impl ChainWriter for MockChain {
    fn signer_address(&self) -> Option<Address> {
        self.state.read().accounts.first().copied()
    }

    async fn submit(&self, to: Address, input: Bytes) -> Result<TxHash> {
        let latch = self.submission_latch.lock().take();
        if let Some(latch) = latch {
            debug!("Holding submission to {}", to);
            latch.notified().await;
        }

        let mut state = self.state.write();
        Self::wallet_check(&state)?;
        if let Some(reason) = state.next_submission_failure.take() {
            return Err(ChainError::Rejected(reason));
        }
        let from = state.accounts.first().copied().ok_or(ChainError::NoSigner)?;

        let applied = if std::mem::take(&mut state.revert_next_execution) {
            None
        } else {
            self.apply_macro(&state, to, &input)
        };
        let success = applied.is_some();
        if let Some((pool, distribution)) = applied {
            state.distributions.insert(pool, distribution);
        }

        let hash = Self::generate_mock_hash(&mut state);
        state.block_number += 1;
        let receipt = TransactionReceipt {
            tx_hash: hash,
            block_number: Some(state.block_number),
            gas_used: 180_000,
            success,
        };
        state.receipts.insert(hash, receipt);
        state.transactions.push(MockTransaction { hash, from, to, input, success });

        debug!("Mock transaction {} ({})", hash, if success { "applied" } else { "reverted" });
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        self.state
            .read()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| ChainError::Rpc(format!("unknown transaction {}", tx_hash)))
    }
}

#[async_trait]
impl NetworkProvider for MockChain {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let state = self.state.read();
        Self::wallet_check(&state)?;
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.state.read().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        let mut state = self.state.write();
        Self::wallet_check(&state)?;
        if !state.known_chains.contains(&chain_id) {
            return Err(ChainError::Wallet {
                code: UNRECOGNIZED_CHAIN,
                message: format!("Unrecognized chain ID {:#x}", chain_id),
            });
        }
        state.chain_id = chain_id;
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDefinition) -> Result<()> {
        let mut state = self.state.write();
        Self::wallet_check(&state)?;
        state.known_chains.insert(network.chain_id);
        state.chain_id = network.chain_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: Address = Address::repeat_byte(0x11);
    const TOKEN: Address = Address::repeat_byte(0x22);

    #[tokio::test]
    async fn test_unknown_address_returns_empty_output() {
        let chain = MockChain::new(10, ContractAddresses::default());
        let input = Bytes::from(ISuperfluidPool::superTokenCall {}.abi_encode());
        let output = chain.call(None, Address::repeat_byte(0x99), input).await.unwrap();
        assert!(output.is_empty());
        assert_eq!(chain.call_count(), 1);
    }

    #[tokio::test]
    async fn test_switch_to_unknown_chain_is_4902() {
        let chain = MockChain::new(10, ContractAddresses::default());
        let err = chain.switch_chain(11_155_420).await.unwrap_err();
        assert_eq!(err.wallet_code(), Some(UNRECOGNIZED_CHAIN));

        chain.add_chain(&NetworkDefinition::op_sepolia()).await.unwrap();
        assert_eq!(chain.chain_id().await.unwrap(), 11_155_420);
        chain.switch_chain(10).await.unwrap();
        assert_eq!(chain.chain_id().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_rejected_wallet_request_is_4001() {
        let chain = MockChain::new(10, ContractAddresses::default());
        chain.reject_wallet_requests(true);
        let err = chain.request_accounts().await.unwrap_err();
        assert_eq!(err.wallet_code(), Some(USER_REJECTED));
    }

    #[tokio::test]
    async fn test_submit_without_account_fails() {
        let chain = MockChain::new(10, ContractAddresses::default());
        let err = chain
            .submit(ContractAddresses::default().macro_forwarder, Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err, ChainError::NoSigner);
    }

    #[tokio::test]
    async fn test_garbage_submission_is_included_but_reverted() {
        let chain = MockChain::new(10, ContractAddresses::default());
        chain.add_account(Address::repeat_byte(0x33));
        chain.add_pool(POOL, TOKEN);

        let hash = chain
            .submit(ContractAddresses::default().macro_forwarder, Bytes::from(vec![1, 2, 3]))
            .await
            .unwrap();
        let receipt = chain.wait_for_receipt(hash).await.unwrap();

        assert!(!receipt.success);
        assert!(chain.distribution(POOL).is_none());
    }
}

//! Network and contract configuration types

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Optimism Sepolia chain id (`0xaa37dc`)
pub const OP_SEPOLIA_CHAIN_ID: u64 = 11_155_420;

/// Macro forwarder deployment (same address on every supported chain)
pub const MACRO_FORWARDER: Address = address!("FD0268E33111565dE546af2675351A4b1587F89F");

/// Rewards macro deployment on Optimism Sepolia
pub const REWARDS_MACRO: Address = address!("A315e7EB0a278fac7B3a74DB895f5bf801EAb632");

/// Native currency metadata announced when adding a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to switch to (or add) a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDefinition {
    pub chain_id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub explorer_urls: Vec<String>,
}

impl NetworkDefinition {
    pub fn op_sepolia() -> Self {
        Self {
            chain_id: OP_SEPOLIA_CHAIN_ID,
            name: "Optimism Sepolia".to_string(),
            native_currency: NativeCurrency {
                name: "ETH".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://sepolia.optimism.io".to_string()],
            explorer_urls: vec!["https://sepolia-optimism.etherscan.io/".to_string()],
        }
    }

    /// Chain id in the `0x`-prefixed hex form wallets expect
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Explorer link for a transaction, if an explorer is configured
    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_urls
            .first()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

impl Default for NetworkDefinition {
    fn default() -> Self {
        Self::op_sepolia()
    }
}

/// Contracts the distribution pipeline talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Dispatcher that runs macros atomically
    pub macro_forwarder: Address,
    /// Macro that derives distribution parameters
    pub rewards_macro: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            macro_forwarder: MACRO_FORWARDER,
            rewards_macro: REWARDS_MACRO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_sepolia_chain_id_hex() {
        let net = NetworkDefinition::op_sepolia();
        assert_eq!(net.chain_id_hex(), "0xaa37dc");
    }

    #[test]
    fn test_tx_url() {
        let net = NetworkDefinition::op_sepolia();
        assert_eq!(
            net.tx_url("0x01").unwrap(),
            "https://sepolia-optimism.etherscan.io/tx/0x01"
        );

        let mut bare = net.clone();
        bare.explorer_urls.clear();
        assert!(bare.tx_url("0x01").is_none());
    }

    #[test]
    fn test_network_serialization() {
        let net = NetworkDefinition::default();
        let json = serde_json::to_string(&net).unwrap();
        let parsed: NetworkDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, net);
    }

    #[test]
    fn test_default_contracts() {
        let contracts = ContractAddresses::default();
        assert_eq!(contracts.macro_forwarder, MACRO_FORWARDER);
        assert_eq!(contracts.rewards_macro, REWARDS_MACRO);
    }
}

//! Pool validity and balance lookup

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use tracing::debug;

use flowcraft_core::{parse_address, PoolInspection, PoolValidity};

use crate::abi::{ISuperToken, ISuperfluidPool};
use crate::ChainReader;

/// Resolves a pool's reward token and the caller's balance of it.
///
/// A pool that cannot answer `superToken()` for any reason is simply
/// invalid. Nothing here is retried.
#[derive(Clone)]
pub struct PoolInspector {
    reader: Arc<dyn ChainReader>,
}

impl PoolInspector {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self { reader }
    }

    /// Inspect `pool_text`, reading the balance of `caller` when known.
    pub async fn inspect(&self, pool_text: &str, caller: Option<Address>) -> PoolInspection {
        let Some(pool) = parse_address(pool_text.trim()) else {
            debug!("Pool '{}' is not a well-formed address", pool_text);
            return PoolInspection::invalid(pool_text);
        };

        let Some(token) = self.super_token(pool).await else {
            return PoolInspection::invalid(pool_text);
        };

        let balance = match caller {
            Some(account) => self.balance_of(token, account).await,
            None => None,
        };

        PoolInspection {
            pool_text: pool_text.to_string(),
            validity: PoolValidity::Valid,
            token: Some(token),
            balance,
        }
    }

    async fn super_token(&self, pool: Address) -> Option<Address> {
        let input = Bytes::from(ISuperfluidPool::superTokenCall {}.abi_encode());
        let output = match self.reader.call(None, pool, input).await {
            Ok(output) => output,
            Err(e) => {
                debug!("superToken() on {} failed: {}", pool, e);
                return None;
            }
        };

        match ISuperfluidPool::superTokenCall::abi_decode_returns(&output, true) {
            Ok(ret) => Some(ret.token),
            Err(e) => {
                debug!("superToken() on {} returned undecodable data: {}", pool, e);
                None
            }
        }
    }

    async fn balance_of(&self, token: Address, account: Address) -> Option<U256> {
        let input = Bytes::from(ISuperToken::balanceOfCall { account }.abi_encode());
        let output = match self.reader.call(None, token, input).await {
            Ok(output) => output,
            Err(e) => {
                debug!("balanceOf({}) on {} failed: {}", account, token, e);
                return None;
            }
        };

        ISuperToken::balanceOfCall::abi_decode_returns(&output, true)
            .map(|ret| ret.balance)
            .ok()
    }
}

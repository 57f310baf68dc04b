//! Remote parameter derivation through the rewards macro

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use flowcraft_core::{FlowError, FlowRate, MacroCallParams, RecipientList, Result, UnitWeight};

use crate::abi::{flow_rate_to_int96, IRewardsMacro};
use crate::ChainReader;

/// Asks the rewards macro to encode a distribution.
///
/// Inputs are validated locally; the encoding itself is entirely the
/// remote contract's.
#[derive(Clone)]
pub struct ParameterBuilder {
    reader: Arc<dyn ChainReader>,
    rewards_macro: Address,
}

impl ParameterBuilder {
    pub fn new(reader: Arc<dyn ChainReader>, rewards_macro: Address) -> Self {
        Self { reader, rewards_macro }
    }

    /// Resolve a parsed recipient list and build params for it.
    pub async fn build_for(
        &self,
        pool: Address,
        recipients: &RecipientList,
        flow_rate: FlowRate,
        signer: Address,
    ) -> Result<MacroCallParams> {
        let addresses = recipients.resolve_addresses()?;
        self.build_params(pool, &addresses, &recipients.units(), flow_rate, signer)
            .await
    }

    /// Call `getParams` with parallel recipient and unit sequences.
    pub async fn build_params(
        &self,
        pool: Address,
        recipients: &[Address],
        units: &[UnitWeight],
        flow_rate: FlowRate,
        signer: Address,
    ) -> Result<MacroCallParams> {
        if recipients.len() != units.len() {
            return Err(FlowError::Validation(format!(
                "{} recipients but {} unit weights",
                recipients.len(),
                units.len()
            )));
        }

        let call = IRewardsMacro::getParamsCall {
            pool,
            recipients: recipients.to_vec(),
            units: units.to_vec(),
            flowRate: flow_rate_to_int96(flow_rate)?,
        };

        info!(
            "Deriving params for pool {} ({} recipients, flow rate {}/s)",
            pool,
            recipients.len(),
            flow_rate
        );

        let output = self
            .reader
            .call(Some(signer), self.rewards_macro, Bytes::from(call.abi_encode()))
            .await
            .map_err(|e| FlowError::remote(e.to_string()))?;

        let params = IRewardsMacro::getParamsCall::abi_decode_returns(&output, true)
            .map_err(|e| FlowError::remote(format!("getParams returned malformed data: {}", e)))?
            .params;

        debug!("Received {} bytes of macro params", params.len());
        Ok(MacroCallParams::new(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockChain;
    use flowcraft_core::{parse_recipients, rate, ContractAddresses};

    const POOL: Address = Address::repeat_byte(0x11);
    const SIGNER: Address = Address::repeat_byte(0x33);

    fn builder() -> (Arc<MockChain>, ParameterBuilder) {
        let contracts = ContractAddresses::default();
        let chain = Arc::new(MockChain::new(10, contracts));
        let builder = ParameterBuilder::new(chain.clone(), contracts.rewards_macro);
        (chain, builder)
    }

    #[tokio::test]
    async fn test_length_mismatch_rejected_before_call() {
        let (chain, builder) = builder();
        let err = builder
            .build_params(POOL, &[Address::repeat_byte(1)], &[1, 2], FlowRate::ZERO, SIGNER)
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::Validation(_)));
        assert_eq!(chain.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_recipient_address_reports_line() {
        let (chain, builder) = builder();
        let list = parse_recipients(
            "0x1111111111111111111111111111111111111111,1\n0xabc,2",
        )
        .unwrap();

        let err = builder
            .build_for(POOL, &list, FlowRate::ZERO, SIGNER)
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::Format { line: 2, .. }));
        assert_eq!(chain.call_count(), 0);
    }

    #[tokio::test]
    async fn test_returns_remote_blob() {
        let (chain, builder) = builder();
        let list = parse_recipients(
            "0x1111111111111111111111111111111111111111,100\n\
             0x2222222222222222222222222222222222222222,200",
        )
        .unwrap();
        let flow_rate = rate::convert("1").unwrap();

        let params = builder.build_for(POOL, &list, flow_rate, SIGNER).await.unwrap();

        assert!(!params.is_empty());
        assert_eq!(chain.call_count(), 1);
    }

    #[tokio::test]
    async fn test_remote_revert_reason_propagated() {
        let (chain, builder) = builder();
        chain.revert_get_params("pool not owned by caller");

        let err = builder
            .build_params(POOL, &[], &[], FlowRate::ZERO, SIGNER)
            .await
            .unwrap_err();

        match err {
            FlowError::RemoteCall { reason } => {
                assert!(reason.contains("pool not owned by caller"))
            }
            other => panic!("expected remote call error, got {:?}", other),
        }
    }
}

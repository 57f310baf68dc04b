//! Contract bindings for the pool, token, rewards macro and forwarder.

use alloy_primitives::aliases::I96;
use alloy_sol_macro::sol;

use flowcraft_core::{FlowError, FlowRate};

sol! {
    interface ISuperfluidPool {
        function superToken() external view returns (address token);
    }

    interface ISuperToken {
        function balanceOf(address account) external view returns (uint256 balance);
    }

    interface IRewardsMacro {
        function getParams(
            address pool,
            address[] memory recipients,
            uint128[] memory units,
            int96 flowRate
        ) external view returns (bytes memory params);
    }

    interface IMacroForwarder {
        function runMacro(address m, bytes calldata params) external payable returns (bool ok);
    }
}

/// Flow rate as the `int96` the macro expects.
pub fn flow_rate_to_int96(rate: FlowRate) -> Result<I96, FlowError> {
    I96::try_from(rate.per_second())
        .map_err(|_| FlowError::Validation(format!("flow rate {} does not fit int96", rate)))
}

/// Human-readable reason from revert data, when it carries one.
pub fn revert_reason(data: &[u8]) -> Option<String> {
    alloy_sol_types::decode_revert_reason(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::{SolCall, SolError};

    #[test]
    fn test_balance_of_selector() {
        assert_eq!(ISuperToken::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_flow_rate_to_int96() {
        let rate = flowcraft_core::rate::convert("1").unwrap();
        let value = flow_rate_to_int96(rate).unwrap();
        assert_eq!(value.to_string(), "11574074074074");
    }

    #[test]
    fn test_revert_reason_decodes_error_string() {
        let data = alloy_sol_types::Revert { reason: "not a pool".to_string() }.abi_encode();
        let reason = revert_reason(&data).unwrap();
        assert!(reason.contains("not a pool"));
    }
}

//! Macro dispatch through the forwarder

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use tracing::{info, warn};

use flowcraft_core::{FlowError, MacroCallParams, Result, TransactionReceipt};

use crate::abi::IMacroForwarder;
use crate::ChainWriter;

/// Submits `runMacro` and waits for the outcome.
///
/// Submission and confirmation run strictly in sequence. A failed attempt
/// is returned to the caller as-is; nothing is resubmitted.
pub struct MacroExecutor {
    writer: Arc<dyn ChainWriter>,
    forwarder: Address,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however `execute` exits.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MacroExecutor {
    pub fn new(writer: Arc<dyn ChainWriter>, forwarder: Address) -> Self {
        Self {
            writer,
            forwarder,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_executing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `macro_address` with `params` via the forwarder.
    pub async fn execute(
        &self,
        macro_address: Address,
        params: MacroCallParams,
    ) -> Result<TransactionReceipt> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected macro execution: another one is in flight");
            return Err(FlowError::ExecutionInProgress);
        }
        let _guard = InFlight(&self.in_flight);

        let signer = self
            .writer
            .signer_address()
            .ok_or_else(|| FlowError::Submission("no signing key available".to_string()))?;

        let input = IMacroForwarder::runMacroCall {
            m: macro_address,
            params: params.into_bytes(),
        }
        .abi_encode();

        info!("Executing macro {} from {}", macro_address, signer);

        let tx_hash = self
            .writer
            .submit(self.forwarder, Bytes::from(input))
            .await
            .map_err(|e| FlowError::Submission(e.to_string()))?;

        info!("Macro transaction submitted: {}", tx_hash);

        let receipt = self
            .writer
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| FlowError::Execution {
                tx_hash: tx_hash.to_string(),
                reason: format!("confirmation failed: {}", e),
            })?;

        if !receipt.success {
            warn!("Macro transaction {} reverted", tx_hash);
            return Err(FlowError::Execution {
                tx_hash: tx_hash.to_string(),
                reason: "transaction reverted".to_string(),
            });
        }

        info!(
            "Macro transaction confirmed: {} (block {:?}, gas {})",
            tx_hash, receipt.block_number, receipt.gas_used
        );
        Ok(receipt)
    }
}

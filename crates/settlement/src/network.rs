//! Wallet network switching

use tracing::{info, warn};

use flowcraft_core::{FlowError, NetworkDefinition};

use crate::{ChainError, NetworkProvider, UNRECOGNIZED_CHAIN};

/// Move the wallet to `network`, registering it first if the wallet has
/// never seen it.
pub async fn switch_to_network(
    provider: &dyn NetworkProvider,
    network: &NetworkDefinition,
) -> Result<(), FlowError> {
    info!("Switching wallet to {} ({})", network.name, network.chain_id_hex());

    match provider.switch_chain(network.chain_id).await {
        Ok(()) => Ok(()),
        Err(e) if e.wallet_code() == Some(UNRECOGNIZED_CHAIN) => {
            info!("Wallet does not know {}, adding it", network.name);
            provider.add_chain(network).await.map_err(wallet_error)
        }
        Err(e) => Err(wallet_error(e)),
    }
}

fn wallet_error(e: ChainError) -> FlowError {
    warn!("Network switch failed: {}", e);
    FlowError::Wallet(e.to_string())
}

//! Session orchestration
//!
//! Drives the chain components on behalf of a [`SessionState`]. The
//! state lock is only ever taken between awaits: each operation reads what
//! it needs, releases the lock, does the remote work and re-acquires it to
//! record the outcome.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use flowcraft_core::{
    parse_recipients, rate, ContractAddresses, FlowError, FlowRate, MacroCallParams,
    NetworkDefinition, PoolInspection, RecipientList, Result, TransactionReceipt,
    DEFAULT_TOKEN_DECIMALS,
};
use flowcraft_settlement::{
    switch_to_network, ChainReader, ChainWriter, MacroExecutor, NetworkProvider,
    ParameterBuilder, PoolInspector,
};

use crate::state::{InspectionTicket, SessionSnapshot, SessionState};

/// A distribution ready to run (or just previewed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionPlan {
    pub recipients: RecipientList,
    pub flow_rate: FlowRate,
    pub params: MacroCallParams,
}

/// Marks the session failed if an execution is abandoned mid-flight.
struct ExecutionGuard {
    session: Arc<Mutex<SessionState>>,
    armed: bool,
}

impl ExecutionGuard {
    fn finish(mut self, outcome: &Result<TransactionReceipt>) {
        self.armed = false;
        self.session.lock().finish_execution(outcome);
    }
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!("Execution abandoned before completion");
            self.session.lock().finish_execution(&Err(FlowError::Submission(
                "execution was interrupted".to_string(),
            )));
        }
    }
}

pub struct DistributionController {
    session: Arc<Mutex<SessionState>>,
    provider: Arc<dyn NetworkProvider>,
    inspector: PoolInspector,
    params: ParameterBuilder,
    executor: MacroExecutor,
    network: NetworkDefinition,
    contracts: ContractAddresses,
    token_decimals: u8,
}

impl DistributionController {
    /// Build a controller over a single chain backend.
    pub fn new<C>(chain: Arc<C>, network: NetworkDefinition, contracts: ContractAddresses) -> Self
    where
        C: ChainReader + ChainWriter + NetworkProvider + 'static,
    {
        Self::from_parts(chain.clone(), chain.clone(), chain, network, contracts)
    }

    /// Build a controller from separate capability handles.
    pub fn from_parts(
        reader: Arc<dyn ChainReader>,
        writer: Arc<dyn ChainWriter>,
        provider: Arc<dyn NetworkProvider>,
        network: NetworkDefinition,
        contracts: ContractAddresses,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(SessionState::new(network.chain_id))),
            provider,
            inspector: PoolInspector::new(reader.clone()),
            params: ParameterBuilder::new(reader, contracts.rewards_macro),
            executor: MacroExecutor::new(writer, contracts.macro_forwarder),
            network,
            contracts,
            token_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }

    /// Decimals of the reward token, used for the tokens/day conversion.
    pub fn with_token_decimals(mut self, decimals: u8) -> Self {
        self.token_decimals = decimals;
        self
    }

    pub fn network(&self) -> &NetworkDefinition {
        &self.network
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    fn fail<T>(&self, err: FlowError) -> Result<T> {
        self.session.lock().report_error(&err);
        Err(err)
    }

    // =========================================================================
    // Wallet and network
    // =========================================================================

    /// Connect the wallet and record its account and chain.
    pub async fn connect(&self) -> Result<SessionSnapshot> {
        let accounts = match self.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => return self.fail(FlowError::Wallet(e.to_string())),
        };
        let Some(account) = accounts.first().copied() else {
            return self.fail(FlowError::NotConnected);
        };
        let chain_id = match self.provider.chain_id().await {
            Ok(id) => id,
            Err(e) => return self.fail(FlowError::Wallet(e.to_string())),
        };

        let ticket = self.session.lock().connect(account, chain_id);
        if let Some(ticket) = ticket {
            self.run_inspection(ticket).await;
        }
        Ok(self.snapshot())
    }

    /// Ask the wallet to move to the configured network.
    pub async fn switch_network(&self) -> Result<SessionSnapshot> {
        if !self.session.lock().is_connected() {
            return self.fail(FlowError::NotConnected);
        }

        if let Err(e) = switch_to_network(self.provider.as_ref(), &self.network).await {
            return self.fail(e);
        }
        info!("Wallet switched to {}", self.network.name);
        self.refresh_network().await
    }

    /// Re-read the wallet's chain and re-evaluate the session against it.
    pub async fn refresh_network(&self) -> Result<SessionSnapshot> {
        let chain_id = match self.provider.chain_id().await {
            Ok(id) => id,
            Err(e) => return self.fail(FlowError::Wallet(e.to_string())),
        };

        let ticket = self.session.lock().set_network(chain_id);
        if let Some(ticket) = ticket {
            self.run_inspection(ticket).await;
        }
        Ok(self.snapshot())
    }

    pub fn disconnect(&self) {
        self.session.lock().disconnect();
    }

    // =========================================================================
    // Pool
    // =========================================================================

    /// Record a new pool address and inspect it.
    ///
    /// Returns the inspection if it was applied; `None` if the address was
    /// cleared or a newer edit superseded this one.
    pub async fn set_pool_address(&self, text: &str) -> Result<Option<PoolInspection>> {
        let ticket = self.session.lock().set_pool_address(text);
        match ticket {
            Ok(Some(ticket)) => Ok(self.run_inspection(ticket).await),
            Ok(None) => Ok(None),
            Err(e) => self.fail(e),
        }
    }

    async fn run_inspection(&self, ticket: InspectionTicket) -> Option<PoolInspection> {
        let account = self.session.lock().account();
        let result = self.inspector.inspect(&ticket.pool_text, account).await;

        if self.session.lock().apply_inspection(&ticket, result.clone()) {
            Some(result)
        } else {
            debug!("Inspection of '{}' superseded", ticket.pool_text);
            None
        }
    }

    // =========================================================================
    // Distribution
    // =========================================================================

    fn prepare(
        &self,
        recipients_text: &str,
        tokens_per_day: &str,
    ) -> Result<(RecipientList, FlowRate)> {
        let recipients = parse_recipients(recipients_text)?;
        if recipients.is_empty() {
            return Err(FlowError::InvalidInput("no recipients entered".to_string()));
        }
        recipients.resolve_addresses()?;
        let flow_rate = rate::tokens_per_day_to_flow_rate(tokens_per_day, self.token_decimals)?;
        Ok((recipients, flow_rate))
    }

    /// Derive the macro params without submitting anything.
    pub async fn preview(
        &self,
        recipients_text: &str,
        tokens_per_day: &str,
    ) -> Result<DistributionPlan> {
        let (recipients, flow_rate) = match self.prepare(recipients_text, tokens_per_day) {
            Ok(prepared) => prepared,
            Err(e) => return self.fail(e),
        };

        let target = {
            let session = self.session.lock();
            session.require_network().and_then(|_| {
                let inspection = session
                    .inspection()
                    .filter(|i| i.is_valid())
                    .ok_or_else(|| FlowError::PoolNotReady("pool has not been validated".into()))?;
                let pool = flowcraft_core::parse_address(&inspection.pool_text)
                    .ok_or_else(|| FlowError::PoolNotReady("pool address is invalid".into()))?;
                let account = session.account().ok_or(FlowError::NotConnected)?;
                Ok((pool, account))
            })
        };
        let (pool, account) = match target {
            Ok(target) => target,
            Err(e) => return self.fail(e),
        };

        match self.params.build_for(pool, &recipients, flow_rate, account).await {
            Ok(params) => Ok(DistributionPlan { recipients, flow_rate, params }),
            Err(e) => self.fail(e),
        }
    }

    /// Parse, derive params, submit and confirm one distribution.
    pub async fn execute(
        &self,
        recipients_text: &str,
        tokens_per_day: &str,
    ) -> Result<TransactionReceipt> {
        let (recipients, flow_rate) = match self.prepare(recipients_text, tokens_per_day) {
            Ok(prepared) => prepared,
            Err(e) => return self.fail(e),
        };

        let admitted = self.session.lock().begin_execution();
        let ticket = match admitted {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!("Execution refused: {}", e);
                return self.fail(e);
            }
        };
        let guard = ExecutionGuard { session: self.session.clone(), armed: true };

        info!(
            "Distributing to {} recipients in pool {} at {} tokens/day (balance {})",
            recipients.len(),
            ticket.pool,
            flow_rate.tokens_per_day(self.token_decimals),
            rate::format_units(ticket.balance, self.token_decimals)
        );

        let outcome = match self
            .params
            .build_for(ticket.pool, &recipients, flow_rate, ticket.account)
            .await
        {
            Ok(params) => self.executor.execute(self.contracts.rewards_macro, params).await,
            Err(e) => Err(e),
        };

        guard.finish(&outcome);
        outcome
    }

    /// Explorer link for the last recorded transaction
    pub fn last_tx_url(&self) -> Option<String> {
        let hash = self.session.lock().last_tx_hash()?.to_string();
        self.network.tx_url(&hash)
    }
}

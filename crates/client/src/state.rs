//! Distribution session state machine
//!
//! Tracks one operator session from wallet connection through a single
//! distribution run. All transitions are synchronous; the controller
//! performs the remote work and feeds results back in.
//!
//! ## Inspection tickets
//!
//! Every pool-address edit (and every network change with a pool present)
//! bumps a generation counter and hands out an [`InspectionTicket`]. A
//! result is applied only if its ticket is still current, so a slow
//! lookup for an old address can never overwrite a newer one.
//!
//! ```text
//! Disconnected ──connect──▶ WrongNetwork ──switch──▶ Ready
//!                                                      │ pool text
//!                                                      ▼
//!                 PoolValid ◀──apply── PoolPending ──apply──▶ PoolInvalid
//!                     │
//!                     ▼ begin_execution
//!                 Executing ──finish──▶ Succeeded | Failed
//! ```

use alloy_primitives::{Address, U256};
use tracing::{debug, info, warn};

use flowcraft_core::{parse_address, FlowError, PoolInspection, Result, TransactionReceipt};

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    WrongNetwork,
    /// Connected on the expected network, no pool entered
    Ready,
    PoolPending,
    PoolValid,
    PoolInvalid,
    Executing,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Disconnected => "disconnected",
            Phase::WrongNetwork => "wrong network",
            Phase::Ready => "ready",
            Phase::PoolPending => "checking pool",
            Phase::PoolValid => "pool valid",
            Phase::PoolInvalid => "pool invalid",
            Phase::Executing => "executing",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        }
    }
}

/// The single message shown to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Status(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Notice::Status(s) | Notice::Error(s) => s,
        }
    }
}

/// Tag for one outstanding pool inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionTicket {
    pub generation: u64,
    pub pool_text: String,
}

/// Everything an admitted execution needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTicket {
    pub pool: Address,
    pub account: Address,
    pub balance: U256,
}

/// Point-in-time copy of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub expected_chain_id: u64,
    pub pool_text: String,
    pub inspection: Option<PoolInspection>,
    pub notice: Option<Notice>,
    pub last_tx_hash: Option<String>,
}

#[derive(Debug)]
pub struct SessionState {
    expected_chain_id: u64,
    phase: Phase,
    account: Option<Address>,
    chain_id: Option<u64>,
    pool_text: String,
    generation: u64,
    inspection: Option<PoolInspection>,
    notice: Option<Notice>,
    last_tx_hash: Option<String>,
}

impl SessionState {
    pub fn new(expected_chain_id: u64) -> Self {
        Self {
            expected_chain_id,
            phase: Phase::Disconnected,
            account: None,
            chain_id: None,
            pool_text: String::new(),
            generation: 0,
            inspection: None,
            notice: None,
            last_tx_hash: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.expected_chain_id
    }

    pub fn pool_text(&self) -> &str {
        &self.pool_text
    }

    pub fn inspection(&self) -> Option<&PoolInspection> {
        self.inspection.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn last_tx_hash(&self) -> Option<&str> {
        self.last_tx_hash.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.phase != Phase::Disconnected
    }

    pub fn on_expected_network(&self) -> bool {
        self.chain_id == Some(self.expected_chain_id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            account: self.account,
            chain_id: self.chain_id,
            expected_chain_id: self.expected_chain_id,
            pool_text: self.pool_text.clone(),
            inspection: self.inspection.clone(),
            notice: self.notice.clone(),
            last_tx_hash: self.last_tx_hash.clone(),
        }
    }

    /// Replace the current notice
    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Record `err` as the current notice
    pub fn report_error(&mut self, err: &FlowError) {
        self.notice = Some(Notice::Error(err.to_string()));
    }

    fn mismatch(&self) -> FlowError {
        FlowError::NetworkMismatch {
            expected: self.expected_chain_id,
            actual: self.chain_id,
        }
    }

    /// Fail unless connected on the expected network
    pub fn require_network(&self) -> Result<()> {
        match self.phase {
            Phase::Disconnected => Err(FlowError::NotConnected),
            Phase::WrongNetwork => Err(self.mismatch()),
            _ if !self.on_expected_network() => Err(self.mismatch()),
            _ => Ok(()),
        }
    }

    /// Record a connected wallet.
    ///
    /// During an execution only the account and chain id are recorded.
    pub fn connect(&mut self, account: Address, chain_id: u64) -> Option<InspectionTicket> {
        info!("Wallet connected: {} on chain {}", account, chain_id);
        self.account = Some(account);
        self.chain_id = Some(chain_id);
        if self.phase == Phase::Executing {
            return None;
        }
        self.phase = Phase::Ready;
        self.notice = Some(Notice::Status(format!("Connected as {}", account)));
        self.reevaluate()
    }

    /// Forget the wallet and everything derived from it.
    pub fn disconnect(&mut self) {
        info!("Wallet disconnected");
        let generation = self.generation + 1;
        *self = Self::new(self.expected_chain_id);
        self.generation = generation;
    }

    /// The wallet reported a (possibly) different chain.
    ///
    /// Ignored while disconnected. During an execution only the chain id
    /// is recorded; the run finishes on its own terms.
    pub fn set_network(&mut self, chain_id: u64) -> Option<InspectionTicket> {
        match self.phase {
            Phase::Disconnected => None,
            Phase::Executing => {
                self.chain_id = Some(chain_id);
                None
            }
            _ => {
                self.chain_id = Some(chain_id);
                self.reevaluate()
            }
        }
    }

    fn reevaluate(&mut self) -> Option<InspectionTicket> {
        self.inspection = None;
        self.generation += 1;

        if !self.on_expected_network() {
            warn!(
                "Wallet is on chain {:?}, expected {}",
                self.chain_id, self.expected_chain_id
            );
            self.phase = Phase::WrongNetwork;
            self.notice = Some(Notice::Error(self.mismatch().to_string()));
            return None;
        }

        if self.pool_text.is_empty() {
            self.phase = Phase::Ready;
            return None;
        }

        self.phase = Phase::PoolPending;
        Some(self.ticket())
    }

    fn ticket(&self) -> InspectionTicket {
        InspectionTicket {
            generation: self.generation,
            pool_text: self.pool_text.clone(),
        }
    }

    /// Record a pool-address edit.
    ///
    /// Returns a ticket to inspect the new address, or `None` when the
    /// address was cleared.
    pub fn set_pool_address(&mut self, text: &str) -> Result<Option<InspectionTicket>> {
        match self.phase {
            Phase::Executing => return Err(FlowError::ExecutionInProgress),
            _ => self.require_network()?,
        }

        self.pool_text = text.trim().to_string();
        self.inspection = None;
        self.generation += 1;

        if self.pool_text.is_empty() {
            self.phase = Phase::Ready;
            return Ok(None);
        }

        self.phase = Phase::PoolPending;
        Ok(Some(self.ticket()))
    }

    /// Apply an inspection result if `ticket` is still current.
    ///
    /// Returns whether the result was applied.
    pub fn apply_inspection(&mut self, ticket: &InspectionTicket, result: PoolInspection) -> bool {
        if self.phase != Phase::PoolPending
            || ticket.generation != self.generation
            || ticket.pool_text != self.pool_text
            || result.pool_text != ticket.pool_text
        {
            debug!(
                "Discarding stale inspection of '{}' (generation {}, current {})",
                ticket.pool_text, ticket.generation, self.generation
            );
            return false;
        }

        if result.is_valid() {
            self.phase = Phase::PoolValid;
            self.notice = Some(Notice::Status(match result.token {
                Some(token) => format!("Pool streams token {}", token),
                None => "Pool is valid".to_string(),
            }));
        } else {
            self.phase = Phase::PoolInvalid;
            self.notice = Some(Notice::Error(format!(
                "{} is not a distribution pool",
                result.pool_text
            )));
        }
        self.inspection = Some(result);
        true
    }

    /// Admit an execution against the current valid pool.
    pub fn begin_execution(&mut self) -> Result<ExecutionTicket> {
        if self.phase == Phase::Executing {
            return Err(FlowError::ExecutionInProgress);
        }
        self.require_network()?;

        let not_ready = match self.phase {
            Phase::Ready => Some("no pool address entered"),
            Phase::PoolPending => Some("pool is still being checked"),
            Phase::PoolInvalid => Some("pool address is invalid"),
            _ => None,
        };
        if let Some(reason) = not_ready {
            return Err(FlowError::PoolNotReady(reason.into()));
        }

        let account = self.account.ok_or(FlowError::NotConnected)?;
        let inspection = self
            .inspection
            .as_ref()
            .filter(|i| i.is_valid())
            .ok_or_else(|| FlowError::PoolNotReady("pool has not been validated".into()))?;
        let pool = parse_address(&inspection.pool_text)
            .ok_or_else(|| FlowError::PoolNotReady("pool address is invalid".into()))?;
        let balance = match inspection.balance {
            None => return Err(FlowError::PoolNotReady("token balance is unknown".into())),
            Some(b) if b.is_zero() => {
                return Err(FlowError::PoolNotReady("no balance of the reward token".into()))
            }
            Some(b) => b,
        };

        self.phase = Phase::Executing;
        self.notice = Some(Notice::Status("Executing distribution...".to_string()));
        Ok(ExecutionTicket { pool, account, balance })
    }

    /// Record the outcome of the admitted execution.
    ///
    /// If the wallet left the expected network mid-run the session ends in
    /// `WrongNetwork` with the pool dropped for re-inspection.
    pub fn finish_execution(&mut self, outcome: &Result<TransactionReceipt>) {
        if self.phase != Phase::Executing {
            debug!("Ignoring execution outcome in phase {}", self.phase.name());
            return;
        }

        match outcome {
            Ok(receipt) => {
                let hash = receipt.tx_hash.to_string();
                info!("Distribution confirmed: {}", hash);
                self.phase = Phase::Succeeded;
                self.notice = Some(Notice::Status(format!("Distribution confirmed in {}", hash)));
                self.last_tx_hash = Some(hash);
            }
            Err(err) => {
                warn!("Distribution failed: {}", err);
                self.phase = Phase::Failed;
                if let FlowError::Execution { tx_hash, .. } = err {
                    self.last_tx_hash = Some(tx_hash.clone());
                }
                self.notice = Some(Notice::Error(err.to_string()));
            }
        }

        if !self.on_expected_network() {
            warn!(
                "Wallet moved to chain {:?} during execution, expected {}",
                self.chain_id, self.expected_chain_id
            );
            self.phase = Phase::WrongNetwork;
            self.inspection = None;
            self.generation += 1;
        }
    }
}

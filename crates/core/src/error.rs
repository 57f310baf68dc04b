use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Invalid input on line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Remote call failed: {reason}")]
    RemoteCall { reason: String },

    #[error("Transaction rejected: {0}")]
    Submission(String),

    #[error("Transaction {tx_hash} failed: {reason}")]
    Execution { tx_hash: String, reason: String },

    #[error("Wrong network: expected chain {expected}, wallet is on {}", fmt_chain(.actual))]
    NetworkMismatch { expected: u64, actual: Option<u64> },

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Pool not ready: {0}")]
    PoolNotReady(String),

    #[error("An execution is already in progress")]
    ExecutionInProgress,

    #[error("Wallet error: {0}")]
    Wallet(String),
}

fn fmt_chain(chain: &Option<u64>) -> String {
    match chain {
        Some(id) => id.to_string(),
        None => "an unknown chain".to_string(),
    }
}

impl FlowError {
    /// True for locally detected, operator-correctable input problems.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::InvalidInput(_))
    }

    pub fn format(line: usize, reason: impl Into<String>) -> Self {
        Self::Format { line, reason: reason.into() }
    }

    pub fn remote(reason: impl Into<String>) -> Self {
        Self::RemoteCall { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

//! FlowCraft Client
//!
//! Operator session for configuring and launching a reward stream.
//!
//! ## Usage
//!
//! ```ignore
//! let controller = DistributionController::new(chain, network, contracts);
//!
//! controller.connect().await?;
//! controller.switch_network().await?;
//! controller.set_pool_address("0x...").await?;
//!
//! let receipt = controller.execute(recipients_text, "100").await?;
//! ```

mod controller;
mod state;

pub use controller::{DistributionController, DistributionPlan};
pub use state::{ExecutionTicket, InspectionTicket, Notice, Phase, SessionSnapshot, SessionState};

//! FlowCraft Core Types
//!
//! Data model, error taxonomy and the local, synchronous parts of the
//! distribution pipeline: recipient parsing and flow-rate conversion.

mod config;
mod error;
pub mod rate;
pub mod recipients;
mod types;

pub use config::*;
pub use error::*;
pub use rate::{FlowRate, DEFAULT_TOKEN_DECIMALS, SECONDS_PER_DAY};
pub use recipients::parse_recipients;
pub use types::*;

//! FlowCraft Keystore
//!
//! Operator key management and path utilities shared by FlowCraft apps.
//!
//! ## Features
//!
//! - secp256k1 signing key loading/generation for live transactions
//! - Hex key files with owner-only permissions
//! - Path expansion (`~`)

mod paths;
mod signer;

pub use paths::{default_config_dir, default_key_path, expand_path};
pub use signer::{load_or_generate_signer, load_signer, save_signer, KeystoreError};

pub type Result<T> = std::result::Result<T, KeystoreError>;

//! Operator signing key storage
//!
//! Keys are stored as a single line of hex (optionally `0x`-prefixed).

use std::path::Path;

use alloy_primitives::B256;
use alloy_signer_local::PrivateKeySigner;
use rand::RngCore;
use thiserror::Error;
use tracing::info;

use crate::Result;

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("Failed to read key file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Failed to write key file {path}: {source}")]
    Write { path: String, source: std::io::Error },

    #[error("Invalid key in {path}: {reason}")]
    InvalidKey { path: String, reason: String },
}

/// Load the signer stored at `path`.
pub fn load_signer(path: &Path) -> Result<PrivateKeySigner> {
    let content = std::fs::read_to_string(path).map_err(|source| KeystoreError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_key(path, content.trim())
}

fn parse_key(path: &Path, text: &str) -> Result<PrivateKeySigner> {
    let invalid = |reason: String| KeystoreError::InvalidKey {
        path: path.display().to_string(),
        reason,
    };

    let hex_part = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(hex_part).map_err(|e| invalid(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(invalid(format!("expected 32 bytes, found {}", bytes.len())));
    }
    PrivateKeySigner::from_bytes(&B256::from_slice(&bytes)).map_err(|e| invalid(e.to_string()))
}

/// Write `signer`'s key to `path`, readable by the owner only.
pub fn save_signer(path: &Path, signer: &PrivateKeySigner) -> Result<()> {
    let write_err = |source| KeystoreError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let content = format!("0x{}\n", hex::encode(signer.to_bytes()));
    std::fs::write(path, content).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(write_err)?;
    }

    Ok(())
}

/// Load the key at `path`, generating and saving a new one if absent.
pub fn load_or_generate_signer(path: &Path) -> Result<PrivateKeySigner> {
    if path.exists() {
        let signer = load_signer(path)?;
        info!("Loaded operator key {} from {:?}", signer.address(), path);
        return Ok(signer);
    }

    let signer = generate_signer(path)?;
    save_signer(path, &signer)?;
    info!("Generated operator key {} at {:?}", signer.address(), path);
    Ok(signer)
}

fn generate_signer(path: &Path) -> Result<PrivateKeySigner> {
    let mut secret = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    PrivateKeySigner::from_bytes(&B256::from(secret)).map_err(|e| KeystoreError::InvalidKey {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

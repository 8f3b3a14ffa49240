//! Loading of the Ethereum private keys that seed every managed account.
//!
//! Security notes:
//! - Raw key text is held in `Zeroizing` buffers and wiped after parsing.
//! - Keys are loaded once at startup; no runtime key rotation.
//! - Never log private key material.

use std::path::PathBuf;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

/// Source of the private keys, one per managed account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// Environment variable holding keys separated by commas or newlines (development).
    Env(String),
    /// File with one hex key per line (production, recommend 0600 permissions).
    File(PathBuf),
}

/// Key loading errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex key #{index}: {source}")]
    HexDecode {
        index: usize,
        #[source]
        source: hex::FromHexError,
    },

    #[error("Invalid private key #{index}: {reason}")]
    InvalidKey { index: usize, reason: String },

    #[error("Duplicate key for address {0}")]
    Duplicate(Address),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load every Ethereum key from the given source.
///
/// Blank lines and `#` comments are skipped. Keys may carry a `0x` prefix.
///
/// # Errors
/// Returns `KeyError` if the source cannot be read, a key is not valid hex,
/// a key is not a valid secp256k1 scalar, or the same key appears twice.
pub fn load_eth_keys(source: &KeySource) -> Result<Vec<PrivateKeySigner>, KeyError> {
    let content: Zeroizing<String> = match source {
        KeySource::Env(var_name) => Zeroizing::new(
            std::env::var(var_name).map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?,
        ),
        KeySource::File(path) => Zeroizing::new(std::fs::read_to_string(path)?),
    };
    parse_eth_keys(&content)
}

fn parse_eth_keys(content: &str) -> Result<Vec<PrivateKeySigner>, KeyError> {
    let mut signers: Vec<PrivateKeySigner> = Vec::new();

    let entries = content
        .split(|c| c == '\n' || c == ',')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    for (index, entry) in entries.enumerate() {
        let trimmed = entry.trim_start_matches("0x");
        let bytes = Zeroizing::new(
            hex::decode(trimmed).map_err(|source| KeyError::HexDecode { index, source })?,
        );
        let signer = PrivateKeySigner::from_slice(&bytes).map_err(|e| KeyError::InvalidKey {
            index,
            reason: e.to_string(),
        })?;
        if signers.iter().any(|s| s.address() == signer.address()) {
            return Err(KeyError::Duplicate(signer.address()));
        }
        signers.push(signer);
    }

    Ok(signers)
}

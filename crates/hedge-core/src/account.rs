//! Account identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a managed account: its contract address as `0x`-prefixed lowercase hex.
///
/// Ordered so that sets of participants have a canonical iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Build from a hex address. Normalizes case and the `0x` prefix.
    pub fn from_hex(address: &str) -> Self {
        let trimmed = address.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed)
            .trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        Self(format!("0x{}", digits.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

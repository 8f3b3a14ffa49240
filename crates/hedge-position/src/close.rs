//! Closing orders derived from exchange position snapshots.

use hedge_core::{AccountId, OrderSide, Size};
use hedge_registry::PositionEntry;
use serde::{Deserialize, Serialize};

/// Why legs are being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// Free collateral fell below the next trade's notional.
    Collateral,
    /// Shutdown cleanup pass.
    Cleanup,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collateral => "collateral",
            Self::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market order that flattens one account's leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseLeg {
    pub account: AccountId,
    pub market: String,
    /// Opposite of the position side.
    pub side: OrderSide,
    /// Full absolute position size.
    pub size: Size,
}

/// Plan the order that flattens `account`'s open position in `symbol`.
///
/// Returns `None` when no open, non-zero position exists for the symbol.
pub fn plan_close_leg(
    account: &AccountId,
    symbol: &str,
    positions: &[PositionEntry],
) -> Option<CloseLeg> {
    positions
        .iter()
        .find(|p| p.market == symbol && p.is_open() && !p.size.is_zero())
        .map(|p| CloseLeg {
            account: account.clone(),
            market: symbol.to_string(),
            side: p.side.closing_side(),
            size: p.size.abs(),
        })
}

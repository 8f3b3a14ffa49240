//! Market metadata and top-of-book snapshot.

use crate::{Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tradable market as listed by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Market symbol (e.g., "ETH-USD-PERP").
    pub symbol: String,
    /// Minimum order size increment (quantum).
    pub order_size_increment: Size,
}

impl Market {
    pub fn new(symbol: impl Into<String>, order_size_increment: Size) -> Self {
        Self {
            symbol: symbol.into(),
            order_size_increment,
        }
    }
}

/// Best bid/offer snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bbo {
    pub bid: Price,
    pub ask: Price,
}

impl Bbo {
    pub fn new(bid: Price, ask: Price) -> Self {
        Self { bid, ask }
    }

    /// Relative spread `(ask - bid) / bid`. `None` when bid is not positive or
    /// the ratio overflows.
    pub fn spread_ratio(&self) -> Option<Decimal> {
        if !self.bid.is_positive() {
            return None;
        }
        (self.ask.inner() - self.bid.inner()).checked_div(self.bid.inner())
    }
}

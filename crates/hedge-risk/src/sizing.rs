//! Spread guard and trade sizing.

use hedge_core::{Bbo, Price, Size};
use rust_decimal::Decimal;

use crate::error::{RiskError, RiskResult};

/// Per-leg order sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeSizes {
    pub long: Size,
    pub short: Size,
}

impl TradeSizes {
    pub const ZERO: Self = Self {
        long: Size::ZERO,
        short: Size::ZERO,
    };

    /// Both legs can be ordered.
    pub fn is_tradeable(&self) -> bool {
        self.long.is_positive() && self.short.is_positive()
    }
}

/// Reject books whose relative spread exceeds `max_ratio`.
///
/// # Errors
/// `InvalidQuote` for a non-positive bid, `SpreadTooWide` above the limit.
pub fn validate_spread(bbo: &Bbo, max_ratio: Decimal) -> RiskResult<()> {
    let ratio = bbo
        .spread_ratio()
        .ok_or_else(|| RiskError::InvalidQuote(format!("bid {} ask {}", bbo.bid, bbo.ask)))?;
    if ratio > max_ratio {
        return Err(RiskError::SpreadTooWide {
            ratio,
            max: max_ratio,
        });
    }
    Ok(())
}

/// Leg sizes for `notional`: long buys `notional / bid`, short sells
/// `notional / ask`, each rounded to the nearest multiple of `increment`.
///
/// Below `min_notional` both sizes are zero.
///
/// # Errors
/// `InvalidQuote` for a non-positive quote or one so small the quotient overflows.
pub fn size_trade(
    notional: Decimal,
    bbo: &Bbo,
    increment: Size,
    min_notional: Decimal,
) -> RiskResult<TradeSizes> {
    if notional < min_notional {
        return Ok(TradeSizes::ZERO);
    }
    let leg = |price: Price| {
        price
            .is_positive()
            .then(|| notional.checked_div(price.inner()))
            .flatten()
            .map(|size| Size::new(size).round_to_increment(increment))
            .ok_or_else(|| RiskError::InvalidQuote(format!("bid {} ask {}", bbo.bid, bbo.ask)))
    };
    Ok(TradeSizes {
        long: leg(bbo.bid)?,
        short: leg(bbo.ask)?,
    })
}

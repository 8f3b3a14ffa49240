//! Quote and quantity newtypes over `rust_decimal`.
//!
//! Signed order fields are derived from these values through
//! [`Size::to_chain_quantum`] / [`Price::to_chain_quantum`], so they never pass
//! through floating point.

use crate::error::{CoreError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of decimals used by the chain for sizes and prices.
pub const CHAIN_QUANTUM_DECIMALS: u32 = 8;

/// Round `value` to the nearest multiple of `increment`.
///
/// Ties go to the even multiple. A zero increment leaves the value unchanged.
#[inline]
pub fn round_to_multiple(value: Decimal, increment: Decimal) -> Decimal {
    if increment.is_zero() {
        return value;
    }
    (value / increment).round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven) * increment
}

/// Convert a decimal to its fixed-point chain representation (`trunc(value * 10^8)`).
fn to_chain_quantum(value: Decimal) -> Result<u128> {
    let scale = Decimal::from(10u64.pow(CHAIN_QUANTUM_DECIMALS));
    let scaled = value
        .checked_mul(scale)
        .ok_or_else(|| CoreError::QuantumOverflow(value.to_string()))?
        .trunc();
    scaled
        .to_u128()
        .ok_or_else(|| CoreError::QuantumOverflow(value.to_string()))
}

/// Quote price. Market orders sign a zero price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Fixed-point chain value (8 decimals, truncated).
    pub fn to_chain_quantum(&self) -> Result<u128> {
        if self.0.is_sign_negative() && !self.0.is_zero() {
            return Err(CoreError::InvalidPrice(self.0.to_string()));
        }
        to_chain_quantum(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Size/quantity with exact decimal precision.
///
/// Always non-negative in orders; the direction lives in `OrderSide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Absolute value (position snapshots report shorts as negative sizes).
    #[inline]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Round to the nearest multiple of the market's size increment.
    #[inline]
    pub fn round_to_increment(&self, increment: Size) -> Self {
        Self(round_to_multiple(self.0, increment.0))
    }

    /// Fixed-point chain value (8 decimals, truncated).
    pub fn to_chain_quantum(&self) -> Result<u128> {
        if self.0.is_sign_negative() && !self.0.is_zero() {
            return Err(CoreError::InvalidSize(self.0.to_string()));
        }
        to_chain_quantum(self.0)
    }

    /// Wire representation without trailing zeros.
    pub fn to_wire(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

//! Risk configuration.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Tunable risk limits (`[risk]` table).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RiskConfig {
    /// Maximum `(ask - bid) / bid` accepted before trading.
    #[serde(default = "default_max_spread_ratio")]
    pub max_spread_ratio: Decimal,
    /// Notional below which no order is placed.
    #[serde(default = "default_min_notional")]
    pub min_notional: Decimal,
    /// Token whose balance counts as free collateral.
    #[serde(default = "default_collateral_token")]
    pub collateral_token: String,
}

fn default_max_spread_ratio() -> Decimal {
    Decimal::new(5, 3)
}

fn default_min_notional() -> Decimal {
    Decimal::from(100)
}

fn default_collateral_token() -> String {
    "USDC".to_string()
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_spread_ratio: default_max_spread_ratio(),
            min_notional: default_min_notional(),
            collateral_token: default_collateral_token(),
        }
    }
}

//! Collateral monitor.
//!
//! Before an account takes a new leg its free collateral is compared with the
//! trade notional. When it falls short, every tracked pair the account
//! participates in is closed (all participants' legs, not only this account's)
//! and the confirmed legs leave the ledger.

use std::collections::BTreeMap;
use std::sync::Arc;

use hedge_core::{Bbo, Size};
use hedge_executor::Executor;
use hedge_position::{CloseReason, HedgePair, PairKey, PairLedger};
use hedge_registry::{BalanceEntry, DynExchangeApi, ManagedAccount};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::RiskConfig;
use crate::error::RiskResult;
use crate::sizing::{self, TradeSizes};

/// Result of a collateral check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollateralStatus {
    Sufficient,
    /// Collateral was short; tracked pairs were closed.
    Unwound {
        pairs: usize,
        failed_legs: usize,
    },
}

pub struct RiskMonitor {
    api: DynExchangeApi,
    executor: Arc<Executor>,
    config: RiskConfig,
}

impl RiskMonitor {
    pub fn new(api: DynExchangeApi, executor: Arc<Executor>, config: RiskConfig) -> Self {
        Self {
            api,
            executor,
            config,
        }
    }

    pub fn validate_spread(&self, bbo: &Bbo) -> RiskResult<()> {
        sizing::validate_spread(bbo, self.config.max_spread_ratio)
    }

    pub fn size_trade(&self, notional: Decimal, bbo: &Bbo, increment: Size) -> RiskResult<TradeSizes> {
        sizing::size_trade(notional, bbo, increment, self.config.min_notional)
    }

    /// Free collateral: balance of the configured token, zero when absent.
    pub fn free_collateral(&self, balances: &[BalanceEntry]) -> Decimal {
        balances
            .iter()
            .find(|b| b.token == self.config.collateral_token)
            .map(|b| b.size)
            .unwrap_or_default()
    }

    /// Unwind `account`'s tracked pairs if its free collateral is below
    /// `required_notional`.
    ///
    /// Each pair is closed at most once; a failure closing one pair does not
    /// stop the others. Failed legs stay in the ledger.
    ///
    /// # Errors
    /// Registry errors while reading the balance or positions.
    pub async fn ensure_collateral(
        &self,
        account: &ManagedAccount,
        accounts: &[ManagedAccount],
        ledger: &mut PairLedger,
        required_notional: Decimal,
    ) -> RiskResult<CollateralStatus> {
        let token = account.bearer()?;
        let balances = self.api.fetch_balance(token.clone()).await?;
        let free = self.free_collateral(&balances);
        if free >= required_notional {
            debug!(account = %account.id(), %free, required = %required_notional, "Collateral sufficient");
            return Ok(CollateralStatus::Sufficient);
        }

        info!(
            account = %account.id(),
            %free,
            required = %required_notional,
            token = %self.config.collateral_token,
            "Insufficient collateral, closing positions"
        );

        let positions = self.api.fetch_positions(token).await?;
        let mut pairs: BTreeMap<PairKey, HedgePair> = BTreeMap::new();
        for position in positions.iter().filter(|p| p.is_open()) {
            match ledger.lookup(&position.market, account.id()) {
                Some(pair) => {
                    pairs.entry(pair.key()).or_insert_with(|| pair.clone());
                }
                None => {
                    debug!(account = %account.id(), market = %position.market, "Untracked position left open");
                }
            }
        }

        let mut failed_legs = 0;
        for (key, pair) in &pairs {
            let results = self
                .executor
                .close_pair(pair, accounts, CloseReason::Collateral)
                .await;
            for result in results {
                if result.outcome.is_confirmed() {
                    ledger.remove_leg(&result.symbol, &result.account);
                } else {
                    failed_legs += 1;
                    warn!(pair = %key, account = %result.account, "Leg still tracked after failed close");
                }
            }
        }

        Ok(CollateralStatus::Unwound {
            pairs: pairs.len(),
            failed_legs,
        })
    }
}

//! Main application orchestration.
//!
//! [`Application`] wires the production stack (REST client, system clock,
//! entropy-seeded randomness, keys from the configured source).
//! [`HedgeEngine`] owns the accounts, ledger and market cache and runs the
//! trading loop on a single task; only order submission fans out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;
use futures_util::future::join_all;
use hedge_core::{Clock, SystemClock};
use hedge_executor::Executor;
use hedge_position::{CloseReason, HedgePair, PairKey, PairLedger};
use hedge_registry::{
    DynExchangeApi, ManagedAccount, MarketCache, RestClient, SessionManager,
};
use hedge_risk::{RiskError, RiskMonitor};
use hedge_signer::{load_eth_keys, paradex_domain, HedgeAccount};
use hedge_telemetry::Metrics;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult, CycleError};
use crate::random::{RandomSource, RngSource};

/// Production entry point.
pub struct Application {
    config: AppConfig,
    api: DynExchangeApi,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let api = Arc::new(RestClient::with_timeout(
            config.http_url.clone(),
            config.request_timeout(),
        )?);
        Ok(Self { config, api })
    }

    /// Load keys, derive accounts and authenticate them.
    pub async fn setup(self) -> AppResult<HedgeEngine> {
        let eth_keys = load_eth_keys(&self.config.keys)?;
        info!(accounts = eth_keys.len(), "Loaded account keys");
        HedgeEngine::setup(
            self.config,
            self.api,
            Arc::new(SystemClock),
            Box::new(RngSource::from_entropy()),
            eth_keys,
        )
        .await
    }
}

/// Draws for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePlan {
    pub market: String,
    pub notional: Decimal,
    /// Index of the long account.
    pub long: usize,
    /// Index of the short account.
    pub short: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SpreadTooWide,
    /// Notional below the floor or too small for the size increment.
    SizeTooSmall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Orders submitted; `legs` of them were accepted.
    Traded { legs: usize },
    Skipped(SkipReason),
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traded { legs: 2 } => "traded",
            Self::Traded { .. } => "partial",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// Summary of the shutdown cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub pairs: usize,
    pub closed_legs: usize,
    pub failed_legs: usize,
}

/// Trading loop state.
pub struct HedgeEngine {
    config: AppConfig,
    api: DynExchangeApi,
    sessions: SessionManager,
    executor: Arc<Executor>,
    risk: RiskMonitor,
    markets: MarketCache,
    ledger: PairLedger,
    accounts: Vec<ManagedAccount>,
    random: Box<dyn RandomSource>,
}

impl HedgeEngine {
    /// Fetch the system config, derive every account and authenticate each.
    ///
    /// A failed initial authentication is logged; the account retries at the
    /// start of its next cycle.
    pub async fn setup(
        config: AppConfig,
        api: DynExchangeApi,
        clock: Arc<dyn Clock>,
        random: Box<dyn RandomSource>,
        eth_keys: Vec<PrivateKeySigner>,
    ) -> AppResult<Self> {
        if eth_keys.len() < 2 {
            return Err(AppError::Config(format!(
                "at least two account keys are required, got {}",
                eth_keys.len()
            )));
        }

        let system = api.fetch_system_config().await?;
        let params = system.derivation_params()?;
        let domain = paradex_domain(system.starknet_chain_felt()?);
        info!(
            starknet_chain_id = %system.starknet_chain_id,
            l1_chain_id = params.l1_chain_id,
            "System config loaded"
        );

        let mut accounts = eth_keys
            .iter()
            .map(|signer| HedgeAccount::derive(signer, &params).map(ManagedAccount::new))
            .collect::<Result<Vec<_>, _>>()?;
        drop(eth_keys);

        let sessions = SessionManager::new(api.clone(), domain.clone(), clock.clone());
        let authenticated = sessions.refresh_all(&mut accounts).await;
        info!(
            accounts = accounts.len(),
            authenticated, "Accounts ready"
        );

        let executor = Arc::new(Executor::new(api.clone(), domain, clock));
        let risk = RiskMonitor::new(api.clone(), executor.clone(), config.risk.clone());

        Ok(Self {
            config,
            api,
            sessions,
            executor,
            risk,
            markets: MarketCache::new(),
            ledger: PairLedger::new(),
            accounts,
            random,
        })
    }

    pub fn accounts(&self) -> &[ManagedAccount] {
        &self.accounts
    }

    pub fn ledger(&self) -> &PairLedger {
        &self.ledger
    }

    /// Run cycles until `shutdown` fires, then run the cleanup pass once.
    pub async fn run(&mut self, shutdown: CancellationToken) -> AppResult<()> {
        info!("Entering trading loop");
        while !shutdown.is_cancelled() {
            let plan = self.plan_cycle();
            match self.run_cycle(&plan).await {
                Ok(outcome) => {
                    Metrics::cycle_completed(outcome.as_str());
                    info!(market = %plan.market, ?outcome, "Cycle finished");
                }
                Err(e) => {
                    Metrics::cycle_completed("failed");
                    error!(market = %plan.market, kind = e.kind(), error = %e, "Cycle failed");
                }
            }

            let cooldown = self.draw_cooldown();
            info!(cooldown_secs = cooldown.as_secs(), "Cooling down");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(cooldown) => {}
            }
        }

        info!("Shutdown requested");
        let report = self.cleanup().await;
        info!(
            pairs = report.pairs,
            closed_legs = report.closed_legs,
            failed_legs = report.failed_legs,
            remaining_pairs = self.ledger.len(),
            "Cleanup completed"
        );
        Ok(())
    }

    /// Draw market, notional and two distinct accounts.
    pub fn plan_cycle(&mut self) -> CyclePlan {
        let market = self.config.markets[self.random.index(self.config.markets.len())].clone();
        let [low, high] = self.config.notional_range;
        let notional = Decimal::from(self.random.uniform_inclusive(low, high));
        let (long, short) = self.random.distinct_pair(self.accounts.len());
        CyclePlan {
            market,
            notional,
            long,
            short,
        }
    }

    fn draw_cooldown(&mut self) -> Duration {
        let [low, high] = self.config.cooldown_secs;
        Duration::from_secs(self.random.uniform_inclusive(low, high))
    }

    /// One trading cycle: refresh sessions, check collateral, size and submit.
    pub async fn run_cycle(&mut self, plan: &CyclePlan) -> Result<CycleOutcome, CycleError> {
        info!(
            market = %plan.market,
            notional = %plan.notional,
            long = %self.accounts[plan.long].id(),
            short = %self.accounts[plan.short].id(),
            "Starting cycle"
        );

        let long_refresh = self.sessions.refresh(&mut self.accounts[plan.long]).await;
        let short_refresh = self.sessions.refresh(&mut self.accounts[plan.short]).await;
        long_refresh.and(short_refresh).map_err(CycleError::Session)?;

        for idx in [plan.long, plan.short] {
            let result = self
                .risk
                .ensure_collateral(
                    &self.accounts[idx],
                    &self.accounts,
                    &mut self.ledger,
                    plan.notional,
                )
                .await;
            if let Err(e) = result {
                warn!(account = %self.accounts[idx].id(), error = %e, "Collateral check failed");
            }
        }

        let bbo = self.api.fetch_bbo(plan.market.clone()).await?;
        match self.risk.validate_spread(&bbo) {
            Ok(()) => {}
            Err(RiskError::SpreadTooWide { ratio, max }) => {
                info!(market = %plan.market, %ratio, %max, "Spread too wide, skipping");
                return Ok(CycleOutcome::Skipped(SkipReason::SpreadTooWide));
            }
            Err(e) => return Err(CycleError::InvalidQuote(e.to_string())),
        }

        let increment = self
            .markets
            .size_increment(self.api.as_ref(), &plan.market)
            .await?;
        let sizes = self
            .risk
            .size_trade(plan.notional, &bbo, increment)
            .map_err(|e| CycleError::InvalidQuote(e.to_string()))?;
        if !sizes.is_tradeable() {
            info!(
                market = %plan.market,
                notional = %plan.notional,
                long_size = %sizes.long,
                short_size = %sizes.short,
                "Size too small, skipping"
            );
            return Ok(CycleOutcome::Skipped(SkipReason::SizeTooSmall));
        }
        debug!(market = %plan.market, bid = %bbo.bid, ask = %bbo.ask, long_size = %sizes.long, short_size = %sizes.short, "Sized trade");

        let outcome = self
            .executor
            .submit_pair(
                &plan.market,
                (&self.accounts[plan.long], sizes.long),
                (&self.accounts[plan.short], sizes.short),
            )
            .await;

        let confirmed = outcome.confirmed();
        if let (Err(e), Err(_)) = (outcome.long.result, outcome.short.result) {
            return Err(CycleError::Execution(e));
        }

        let legs = confirmed.len();
        if legs < 2 {
            warn!(market = %plan.market, "Only one leg confirmed, tracking partial pair");
        }
        if let Err(e) = self.ledger.register(HedgePair::new(plan.market.clone(), confirmed)) {
            warn!(error = %e, "Pair not registered");
        } else {
            Metrics::pair_opened(&plan.market);
        }
        Ok(CycleOutcome::Traded { legs })
    }

    /// Close every tracked pair with an open position.
    ///
    /// Per account: refresh the session, cancel open orders, read positions.
    /// Pairs are deduplicated by [`PairKey`] and closed concurrently; only
    /// confirmed legs leave the ledger. Never fails.
    pub async fn cleanup(&mut self) -> CleanupReport {
        info!(tracked_pairs = self.ledger.len(), "Starting cleanup pass");
        for pair in self.ledger.pairs() {
            debug!(pair = %pair.key(), "Tracked pair");
        }

        let mut pairs: BTreeMap<PairKey, HedgePair> = BTreeMap::new();
        for idx in 0..self.accounts.len() {
            if self.sessions.refresh(&mut self.accounts[idx]).await.is_err() {
                continue;
            }
            let account = &self.accounts[idx];
            let token = match account.bearer() {
                Ok(token) => token,
                Err(e) => {
                    warn!(account = %account.id(), error = %e, "Skipping account in cleanup");
                    continue;
                }
            };

            match self.api.cancel_all_orders(token.clone()).await {
                Ok(()) => info!(account = %account.id(), "Cancelled open orders"),
                Err(e) => warn!(account = %account.id(), error = %e, "Cancel orders failed"),
            }

            let positions = match self.api.fetch_positions(token).await {
                Ok(positions) => positions,
                Err(e) => {
                    warn!(account = %account.id(), error = %e, "Fetch positions failed");
                    continue;
                }
            };
            for position in positions.iter().filter(|p| p.is_open()) {
                if let Some(pair) = self.ledger.lookup(&position.market, account.id()) {
                    pairs.entry(pair.key()).or_insert_with(|| pair.clone());
                }
            }
        }

        let executor = &self.executor;
        let accounts = &self.accounts;
        let closes = pairs
            .values()
            .map(|pair| executor.close_pair(pair, accounts, CloseReason::Cleanup));
        let results = join_all(closes).await;

        let mut report = CleanupReport {
            pairs: pairs.len(),
            ..CleanupReport::default()
        };
        for leg in results.into_iter().flatten() {
            if leg.outcome.is_confirmed() {
                self.ledger.remove_leg(&leg.symbol, &leg.account);
                report.closed_legs += 1;
            } else {
                report.failed_legs += 1;
                warn!(symbol = %leg.symbol, account = %leg.account, "Leg left open after cleanup");
            }
        }
        report
    }
}

//! Paired submission and pair close.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use hedge_core::{AccountId, Clock, OrderSide, Size};
use hedge_position::{plan_close_leg, CloseReason, HedgePair};
use hedge_registry::{DynExchangeApi, ManagedAccount, OrderAck};
use hedge_signer::StarkDomain;
use hedge_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::error::{ExecutorError, ExecutorResult};
use crate::order::OrderSigner;

/// Result of one submitted leg.
#[derive(Debug)]
pub struct LegOutcome {
    pub account: AccountId,
    pub side: OrderSide,
    pub result: ExecutorResult<OrderAck>,
}

impl LegOutcome {
    pub fn is_confirmed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of a paired entry.
#[derive(Debug)]
pub struct PairOutcome {
    pub long: LegOutcome,
    pub short: LegOutcome,
}

impl PairOutcome {
    /// Accounts whose order the exchange accepted.
    pub fn confirmed(&self) -> Vec<AccountId> {
        [&self.long, &self.short]
            .into_iter()
            .filter(|leg| leg.is_confirmed())
            .map(|leg| leg.account.clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.long.is_confirmed() && self.short.is_confirmed()
    }
}

/// Outcome of flattening one leg.
#[derive(Debug)]
pub enum CloseOutcome {
    /// Closing order accepted.
    Closed(OrderAck),
    /// The exchange reports no open position for the leg.
    NoPosition,
    Failed(ExecutorError),
}

impl CloseOutcome {
    /// True when the leg is known to be flat.
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[derive(Debug)]
pub struct LegCloseResult {
    pub account: AccountId,
    pub symbol: String,
    pub outcome: CloseOutcome,
}

/// Signs and submits orders through the exchange service.
pub struct Executor {
    api: DynExchangeApi,
    signer: OrderSigner,
}

impl Executor {
    pub fn new(api: DynExchangeApi, domain: StarkDomain, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            signer: OrderSigner::new(domain, clock),
        }
    }

    /// Sign and submit one market order with the account's current token.
    pub async fn submit_market(
        &self,
        account: &ManagedAccount,
        market: &str,
        side: OrderSide,
        size: Size,
    ) -> ExecutorResult<OrderAck> {
        let token = account.bearer()?;
        let order = self
            .signer
            .market_order(account.account(), market, side, size)?;
        debug!(
            account = %account.id(),
            market = order.market(),
            side = %order.side(),
            size = %order.size(),
            timestamp_ms = order.timestamp_ms(),
            "Signed order"
        );

        let started = Instant::now();
        let result = self.api.submit_order(token, order.to_request()).await;
        Metrics::order_latency(side.as_wire(), started.elapsed().as_secs_f64() * 1000.0);

        match &result {
            Ok(ack) => {
                Metrics::order_submitted(side.as_wire(), "ok");
                info!(
                    account = %account.id(),
                    market,
                    %side,
                    %size,
                    order_id = ?ack.id,
                    "Order submitted"
                );
            }
            Err(e) => {
                Metrics::order_submitted(side.as_wire(), "error");
                warn!(account = %account.id(), market, %side, %size, error = %e, "Order failed");
            }
        }
        result.map_err(ExecutorError::from)
    }

    /// Submit Buy on `long` and Sell on `short` concurrently.
    pub async fn submit_pair(
        &self,
        market: &str,
        long: (&ManagedAccount, Size),
        short: (&ManagedAccount, Size),
    ) -> PairOutcome {
        let (long_result, short_result) = tokio::join!(
            self.submit_market(long.0, market, OrderSide::Buy, long.1),
            self.submit_market(short.0, market, OrderSide::Sell, short.1),
        );
        PairOutcome {
            long: LegOutcome {
                account: long.0.id().clone(),
                side: OrderSide::Buy,
                result: long_result,
            },
            short: LegOutcome {
                account: short.0.id().clone(),
                side: OrderSide::Sell,
                result: short_result,
            },
        }
    }

    /// Flatten `account`'s open position in `symbol`.
    pub async fn close_leg(
        &self,
        account: &ManagedAccount,
        symbol: &str,
        reason: CloseReason,
    ) -> CloseOutcome {
        let outcome = match self.try_close_leg(account, symbol).await {
            Ok(Some(ack)) => CloseOutcome::Closed(ack),
            Ok(None) => CloseOutcome::NoPosition,
            Err(e) => CloseOutcome::Failed(e),
        };
        match &outcome {
            CloseOutcome::Failed(e) => {
                Metrics::leg_closed(reason.as_str(), "error");
                warn!(account = %account.id(), symbol, %reason, error = %e, "Leg close failed");
            }
            _ => Metrics::leg_closed(reason.as_str(), "ok"),
        }
        outcome
    }

    async fn try_close_leg(
        &self,
        account: &ManagedAccount,
        symbol: &str,
    ) -> ExecutorResult<Option<OrderAck>> {
        let positions = self.api.fetch_positions(account.bearer()?).await?;
        let Some(leg) = plan_close_leg(account.id(), symbol, &positions) else {
            return Ok(None);
        };
        let ack = self
            .submit_market(account, &leg.market, leg.side, leg.size)
            .await?;
        Ok(Some(ack))
    }

    /// Flatten every participant of `pair` concurrently.
    ///
    /// Participants missing from `accounts` fail with `UnknownAccount`.
    pub async fn close_pair(
        &self,
        pair: &HedgePair,
        accounts: &[ManagedAccount],
        reason: CloseReason,
    ) -> Vec<LegCloseResult> {
        info!(symbol = pair.symbol(), legs = pair.len(), %reason, "Closing hedge pair");
        let closes = pair.participants().map(|id| async move {
            let outcome = match accounts.iter().find(|a| a.id() == id) {
                Some(account) => self.close_leg(account, pair.symbol(), reason).await,
                None => CloseOutcome::Failed(ExecutorError::UnknownAccount(id.clone())),
            };
            LegCloseResult {
                account: id.clone(),
                symbol: pair.symbol().to_string(),
                outcome,
            }
        });
        join_all(closes).await
    }
}

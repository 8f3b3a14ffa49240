//! Trading loop tests against the in-process mock exchange.
//!
//! Covers:
//! - Paired entry sizing and ledger registration
//! - Spread, collateral and partial-fill handling
//! - Shutdown cleanup (pair dedup, cancellation)

use std::sync::Arc;
use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;
use hedge_bot::{
    AppConfig, AppError, CycleError, CycleOutcome, CyclePlan, HedgeEngine, ScriptedRandom,
    SkipReason,
};
use hedge_core::{AccountId, Bbo, Clock, Market, Price, Size};
use hedge_registry::{ExchangeApi, MockExchange};
use hedge_risk::RiskConfig;
use hedge_signer::{HedgeAccount, KeySource};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

const ETH: &str = "ETH-USD-PERP";

const KEYS: [&str; 4] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
];

struct FixedClock;

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        1_700_000_000_000
    }
}

fn config(cooldown_secs: [u64; 2]) -> AppConfig {
    AppConfig {
        http_url: "http://mock".to_string(),
        markets: vec![ETH.to_string()],
        notional_range: [100, 100],
        cooldown_secs,
        request_timeout_ms: 1_000,
        keys: KeySource::Env("UNUSED".to_string()),
        risk: RiskConfig::default(),
    }
}

fn eth_keys(count: usize) -> Vec<PrivateKeySigner> {
    KEYS[..count].iter().map(|k| k.parse().unwrap()).collect()
}

fn exchange() -> Arc<MockExchange> {
    let exchange = Arc::new(MockExchange::new());
    exchange.add_market(Market::new(ETH, Size::new(dec!(0.001))));
    exchange.set_bbo(ETH, Bbo::new(Price::new(dec!(2000)), Price::new(dec!(2001))));
    exchange
}

async fn engine(
    exchange: &Arc<MockExchange>,
    accounts: usize,
    cooldown_secs: [u64; 2],
    script: impl IntoIterator<Item = u64>,
) -> HedgeEngine {
    engine_with_config(exchange, config(cooldown_secs), accounts, script).await
}

async fn engine_with_config(
    exchange: &Arc<MockExchange>,
    config: AppConfig,
    accounts: usize,
    script: impl IntoIterator<Item = u64>,
) -> HedgeEngine {
    let engine = HedgeEngine::setup(
        config,
        exchange.clone(),
        Arc::new(FixedClock),
        Box::new(ScriptedRandom::new(script)),
        eth_keys(accounts),
    )
    .await
    .unwrap();
    for account in engine.accounts() {
        exchange.set_balance(account.id(), dec!(1000));
    }
    engine
}

fn plan(long: usize, short: usize) -> CyclePlan {
    CyclePlan {
        market: ETH.to_string(),
        notional: dec!(100),
        long,
        short,
    }
}

fn id(engine: &HedgeEngine, idx: usize) -> AccountId {
    engine.accounts()[idx].id().clone()
}

#[tokio::test]
async fn test_setup_requires_two_accounts() {
    let exchange = exchange();
    let result = HedgeEngine::setup(
        config([0, 0]),
        exchange.clone(),
        Arc::new(FixedClock),
        Box::new(ScriptedRandom::default()),
        eth_keys(1),
    )
    .await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_setup_tolerates_failed_authentication() {
    let exchange = exchange();
    let system = exchange.fetch_system_config().await.unwrap();
    let params = system.derivation_params().unwrap();
    let second = HedgeAccount::derive(&eth_keys(2)[1], &params).unwrap();
    exchange.fail_auth_for(second.id());

    let engine = engine(&exchange, 2, [0, 0], []).await;

    assert_eq!(engine.accounts().len(), 2);
    assert!(engine.accounts()[0].session().is_some());
    assert!(engine.accounts()[1].session().is_none());
    assert_eq!(engine.accounts()[1].id(), second.id());
}

#[tokio::test]
async fn test_plan_draws_market_notional_and_distinct_accounts() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 4, [0, 0], [0, 100, 3, 3]).await;

    let plan = engine.plan_cycle();

    assert_eq!(plan.market, ETH);
    assert_eq!(plan.notional, Decimal::from(100));
    assert_eq!((plan.long, plan.short), (3, 0));
}

#[tokio::test]
async fn test_cycle_opens_hedged_pair() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 2, [0, 0], []).await;

    let outcome = engine.run_cycle(&plan(0, 1)).await.unwrap();

    assert_eq!(outcome, CycleOutcome::Traded { legs: 2 });
    let submissions = exchange.submissions();
    assert_eq!(submissions.len(), 2);
    assert!(submissions.iter().all(|(_, order)| order.size == "0.05"));
    assert_eq!(exchange.position(&id(&engine, 0), ETH), dec!(0.05));
    assert_eq!(exchange.position(&id(&engine, 1), ETH), dec!(-0.05));

    let pair = engine.ledger().lookup(ETH, &id(&engine, 0)).unwrap();
    assert!(pair.contains(&id(&engine, 1)));
    assert_eq!(engine.ledger().len(), 1);
}

#[tokio::test]
async fn test_wide_spread_skips_cycle() {
    let exchange = exchange();
    exchange.set_bbo(ETH, Bbo::new(Price::new(dec!(100)), Price::new(dec!(100.6))));
    let mut engine = engine(&exchange, 2, [0, 0], []).await;

    let outcome = engine.run_cycle(&plan(0, 1)).await.unwrap();

    assert_eq!(outcome, CycleOutcome::Skipped(SkipReason::SpreadTooWide));
    assert!(exchange.submissions().is_empty());
    assert!(engine.ledger().is_empty());
}

#[tokio::test]
async fn test_notional_below_increment_skips_cycle() {
    let exchange = exchange();
    exchange.add_market(Market::new("BTC-USD-PERP", Size::new(dec!(0.01))));
    exchange.set_bbo(
        "BTC-USD-PERP",
        Bbo::new(Price::new(dec!(60000)), Price::new(dec!(60010))),
    );
    let mut engine = engine(&exchange, 2, [0, 0], []).await;

    let mut btc = plan(0, 1);
    btc.market = "BTC-USD-PERP".to_string();
    let outcome = engine.run_cycle(&btc).await.unwrap();

    assert_eq!(outcome, CycleOutcome::Skipped(SkipReason::SizeTooSmall));
    assert!(exchange.submissions().is_empty());
}

#[tokio::test]
async fn test_unknown_market_fails_cycle() {
    let exchange = exchange();
    exchange.set_bbo("SOL-USD-PERP", Bbo::new(Price::new(dec!(100)), Price::new(dec!(100.1))));
    let mut engine = engine(&exchange, 2, [0, 0], []).await;

    let mut sol = plan(0, 1);
    sol.market = "SOL-USD-PERP".to_string();
    let err = engine.run_cycle(&sol).await.unwrap_err();

    assert!(matches!(err, CycleError::MarketNotFound(_)));
}

#[tokio::test]
async fn test_session_failure_aborts_cycle() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 2, [0, 0], []).await;
    exchange.fail_auth_for(&id(&engine, 1));

    let err = engine.run_cycle(&plan(0, 1)).await.unwrap_err();

    assert!(matches!(err, CycleError::Session(_)));
    assert_eq!(err.kind(), "network");
    assert!(exchange.submissions().is_empty());
}

#[tokio::test]
async fn test_partial_fill_tracks_confirmed_leg() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 2, [0, 0], []).await;
    exchange.fail_submit_for(&id(&engine, 1));

    let outcome = engine.run_cycle(&plan(0, 1)).await.unwrap();

    assert_eq!(outcome, CycleOutcome::Traded { legs: 1 });
    assert_eq!(outcome.as_str(), "partial");
    let pair = engine.ledger().lookup(ETH, &id(&engine, 0)).unwrap();
    assert_eq!(pair.len(), 1);
    assert!(engine.ledger().lookup(ETH, &id(&engine, 1)).is_none());
}

#[tokio::test]
async fn test_both_legs_rejected_is_execution_error() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 2, [0, 0], []).await;
    exchange.fail_submit_for(&id(&engine, 0));
    exchange.fail_submit_for(&id(&engine, 1));

    let err = engine.run_cycle(&plan(0, 1)).await.unwrap_err();

    assert!(matches!(err, CycleError::Execution(_)));
    assert!(engine.ledger().is_empty());
}

#[tokio::test]
async fn test_low_collateral_unwinds_before_new_entry() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 3, [0, 0], []).await;
    engine.run_cycle(&plan(0, 1)).await.unwrap();
    exchange.set_balance(&id(&engine, 0), dec!(10));

    let outcome = engine.run_cycle(&plan(0, 2)).await.unwrap();

    assert_eq!(outcome, CycleOutcome::Traded { legs: 2 });
    // Old pair flattened on both accounts, then the new entry.
    assert_eq!(exchange.position(&id(&engine, 1), ETH), dec!(0));
    assert_eq!(exchange.position(&id(&engine, 0), ETH), dec!(0.05));
    assert_eq!(exchange.position(&id(&engine, 2), ETH), dec!(-0.05));
    let pair = engine.ledger().lookup(ETH, &id(&engine, 0)).unwrap();
    assert!(pair.contains(&id(&engine, 2)));
    assert!(!pair.contains(&id(&engine, 1)));
}

#[tokio::test]
async fn test_cleanup_closes_each_pair_once() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 4, [0, 0], []).await;
    engine.run_cycle(&plan(0, 1)).await.unwrap();
    engine.run_cycle(&plan(2, 3)).await.unwrap();
    assert_eq!(engine.ledger().len(), 2);
    exchange.clear_submissions();

    let report = engine.cleanup().await;

    assert_eq!(report.pairs, 2);
    assert_eq!(report.closed_legs, 4);
    assert_eq!(report.failed_legs, 0);
    assert_eq!(exchange.submissions().len(), 4);
    assert_eq!(exchange.cancels().len(), 4);
    assert!(engine.ledger().is_empty());
    for idx in 0..4 {
        assert_eq!(exchange.position(&id(&engine, idx), ETH), dec!(0));
    }
}

#[tokio::test]
async fn test_cleanup_merged_pair_closes_every_participant() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 3, [0, 0], []).await;
    engine.run_cycle(&plan(0, 1)).await.unwrap();
    engine.run_cycle(&plan(1, 2)).await.unwrap();
    assert_eq!(engine.ledger().len(), 1);
    exchange.clear_submissions();

    let report = engine.cleanup().await;

    assert_eq!(report.pairs, 1);
    // Account 1 is flat (long then short), so only two closing orders.
    assert_eq!(report.closed_legs, 3);
    assert_eq!(exchange.submissions().len(), 2);
    assert!(engine.ledger().is_empty());
}

#[tokio::test]
async fn test_cleanup_keeps_failed_legs_tracked() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 2, [0, 0], []).await;
    engine.run_cycle(&plan(0, 1)).await.unwrap();
    exchange.fail_submit_for(&id(&engine, 1));

    let report = engine.cleanup().await;

    assert_eq!(report.closed_legs, 1);
    assert_eq!(report.failed_legs, 1);
    assert!(engine.ledger().lookup(ETH, &id(&engine, 0)).is_none());
    assert!(engine.ledger().lookup(ETH, &id(&engine, 1)).is_some());

    exchange.clear_failures();
    let retry = engine.cleanup().await;

    assert_eq!(retry.pairs, 1);
    assert_eq!(retry.closed_legs, 1);
    assert!(engine.ledger().is_empty());
    assert_eq!(exchange.position(&id(&engine, 1), ETH), dec!(0));
}

#[tokio::test]
async fn test_run_cleans_up_after_shutdown() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 2, [60, 60], [0, 100, 0, 0]).await;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    tokio::time::timeout(Duration::from_secs(10), engine.run(shutdown))
        .await
        .expect("run should stop after shutdown")
        .unwrap();

    // One entry pair, then one closing pair.
    assert_eq!(exchange.submissions().len(), 4);
    assert!(engine.ledger().is_empty());
    assert_eq!(exchange.position(&id(&engine, 0), ETH), dec!(0));
    assert_eq!(exchange.position(&id(&engine, 1), ETH), dec!(0));
}

#[tokio::test]
async fn test_run_continues_after_failed_cycle() {
    let exchange = exchange();
    exchange.set_bbo(
        "SOL-USD-PERP",
        Bbo::new(Price::new(dec!(100)), Price::new(dec!(100.1))),
    );
    let mut config = config([0, 60]);
    config.markets = vec!["SOL-USD-PERP".to_string(), ETH.to_string()];
    // Cycle 1: SOL (not listed), zero cooldown. Cycle 2: ETH, long cooldown.
    let script = [0, 100, 0, 0, 0, 1, 100, 0, 0, 60];
    let mut engine = engine_with_config(&exchange, config, 2, script).await;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    tokio::time::timeout(Duration::from_secs(10), engine.run(shutdown))
        .await
        .expect("run should stop after shutdown")
        .unwrap();

    // Second cycle traded, cleanup flattened it.
    let submissions = exchange.submissions();
    assert_eq!(submissions.len(), 4);
    assert!(submissions.iter().all(|(_, order)| order.market == ETH));
    assert!(engine.ledger().is_empty());
}

#[tokio::test]
async fn test_run_with_cancelled_token_only_cleans_up() {
    let exchange = exchange();
    let mut engine = engine(&exchange, 2, [0, 0], []).await;
    engine.run_cycle(&plan(1, 0)).await.unwrap();

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    engine.run(shutdown).await.unwrap();

    assert_eq!(exchange.submissions().len(), 4);
    assert!(engine.ledger().is_empty());
}

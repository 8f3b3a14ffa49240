//! In-memory exchange for tests.
//!
//! Market orders fill immediately at the requested size and net into
//! per-account positions. Signatures are verified for accounts whose public
//! key was registered with [`MockExchange::register_account`].

use std::collections::{HashMap, HashSet};

use hedge_core::{AccountId, Bbo, Market, OrderSide, PositionSide, Size};
use hedge_signer::felt::felt_from_str;
use hedge_signer::{paradex_domain, AuthRequest, Felt, OrderMessage, StarkDomain, TypedStruct};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::api::{
    AuthHeaders, BalanceEntry, BoxFuture, ExchangeApi, OrderAck, OrderRequest, PositionEntry,
    PositionStatus, SystemConfig,
};
use crate::error::{RegistryError, RegistryResult};

/// Collateral token reported by default.
pub const MOCK_COLLATERAL_TOKEN: &str = "USDC";

#[derive(Default)]
struct MockState {
    system_config: Option<SystemConfig>,
    markets: Vec<Market>,
    bbo: HashMap<String, Bbo>,
    balances: HashMap<AccountId, Decimal>,
    positions: HashMap<(AccountId, String), Decimal>,
    public_keys: HashMap<AccountId, Felt>,
    sessions: HashMap<String, AccountId>,
    auth_failures: HashSet<AccountId>,
    submit_failures: HashSet<AccountId>,
    submissions: Vec<(AccountId, OrderRequest)>,
    cancels: Vec<AccountId>,
    auth_count: usize,
    markets_fetch_count: usize,
    next_order_id: u64,
}

/// Mock exchange.
pub struct MockExchange {
    state: Mutex<MockState>,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchange {
    pub fn new() -> Self {
        let state = MockState {
            system_config: Some(SystemConfig {
                starknet_chain_id: "PRIVATE_SN_POTC_SEPOLIA".to_string(),
                l1_chain_id: "11155111".to_string(),
                paraclear_account_proxy_hash: "0x1234".to_string(),
                paraclear_account_hash: "0x5678".to_string(),
            }),
            ..MockState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Make `fetch_system_config` fail.
    pub fn clear_system_config(&self) {
        self.state.lock().system_config = None;
    }

    pub fn add_market(&self, market: Market) {
        self.state.lock().markets.push(market);
    }

    pub fn set_bbo(&self, symbol: &str, bbo: Bbo) {
        self.state.lock().bbo.insert(symbol.to_string(), bbo);
    }

    /// Free collateral for `account` in the collateral token.
    pub fn set_balance(&self, account: &AccountId, amount: Decimal) {
        self.state.lock().balances.insert(account.clone(), amount);
    }

    /// Signed position size (negative = short).
    pub fn set_position(&self, account: &AccountId, market: &str, size: Decimal) {
        self.state
            .lock()
            .positions
            .insert((account.clone(), market.to_string()), size);
    }

    /// Enable signature checks for `account`.
    pub fn register_account(&self, account: &AccountId, public_key: Felt) {
        self.state
            .lock()
            .public_keys
            .insert(account.clone(), public_key);
    }

    pub fn fail_auth_for(&self, account: &AccountId) {
        self.state.lock().auth_failures.insert(account.clone());
    }

    pub fn fail_submit_for(&self, account: &AccountId) {
        self.state.lock().submit_failures.insert(account.clone());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.auth_failures.clear();
        state.submit_failures.clear();
    }

    /// Chain id felt of the configured system config.
    pub fn starknet_chain_felt(&self) -> Felt {
        self.state
            .lock()
            .system_config
            .as_ref()
            .and_then(|c| c.starknet_chain_felt().ok())
            .unwrap_or(Felt::ZERO)
    }

    pub fn submissions(&self) -> Vec<(AccountId, OrderRequest)> {
        self.state.lock().submissions.clone()
    }

    pub fn clear_submissions(&self) {
        self.state.lock().submissions.clear();
    }

    pub fn cancels(&self) -> Vec<AccountId> {
        self.state.lock().cancels.clone()
    }

    pub fn auth_count(&self) -> usize {
        self.state.lock().auth_count
    }

    pub fn markets_fetch_count(&self) -> usize {
        self.state.lock().markets_fetch_count
    }

    pub fn position(&self, account: &AccountId, market: &str) -> Decimal {
        self.state
            .lock()
            .positions
            .get(&(account.clone(), market.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn domain(state: &MockState) -> StarkDomain {
        let chain = state
            .system_config
            .as_ref()
            .and_then(|c| c.starknet_chain_felt().ok())
            .unwrap_or(Felt::ZERO);
        paradex_domain(chain)
    }

    fn account_for_token(state: &MockState, token: &str) -> RegistryResult<AccountId> {
        state.sessions.get(token).cloned().ok_or(RegistryError::Http {
            status: 401,
            body: "unknown token".to_string(),
        })
    }

    fn verify(
        state: &MockState,
        account: &AccountId,
        message: &TypedStruct,
        signature: &str,
    ) -> RegistryResult<()> {
        let Some(public_key) = state.public_keys.get(account) else {
            return Ok(());
        };
        let parts: Vec<String> = serde_json::from_str(signature)?;
        let invalid = || RegistryError::Http {
            status: 401,
            body: "invalid signature".to_string(),
        };
        if parts.len() != 2 {
            return Err(invalid());
        }
        let r = felt_from_str(&parts[0])?;
        let s = felt_from_str(&parts[1])?;
        let address = felt_from_str(account.as_str())?;
        let hash = Self::domain(state).message_hash(address, message)?;
        match starknet_crypto::verify(public_key, &hash, &r, &s) {
            Ok(true) => Ok(()),
            _ => Err(invalid()),
        }
    }

    fn handle_auth(&self, headers: &AuthHeaders) -> RegistryResult<String> {
        let mut state = self.state.lock();
        state.auth_count += 1;
        let account = AccountId::from_hex(&headers.account);
        if state.auth_failures.contains(&account) {
            return Err(RegistryError::Http {
                status: 401,
                body: "auth rejected".to_string(),
            });
        }
        let request = AuthRequest {
            timestamp: headers.timestamp,
            expiration: headers.expiration,
        };
        Self::verify(&state, &account, &request.to_typed()?, &headers.signature)?;

        let jwt = format!("jwt-{}-{}", account, state.auth_count);
        state.sessions.insert(jwt.clone(), account);
        Ok(jwt)
    }

    fn handle_submit(&self, token: &str, order: &OrderRequest) -> RegistryResult<OrderAck> {
        let mut state = self.state.lock();
        let account = Self::account_for_token(&state, token)?;
        if state.submit_failures.contains(&account) {
            return Err(RegistryError::Http {
                status: 400,
                body: "order rejected".to_string(),
            });
        }
        let size: Size = order
            .size
            .parse()
            .map_err(|e| RegistryError::Decode(format!("size {:?}: {e}", order.size)))?;
        let message = OrderMessage {
            timestamp_ms: order.signature_timestamp,
            market: order.market.clone(),
            side: order.side,
            order_type: order.order_type,
            size,
            price: None,
        };
        Self::verify(&state, &account, &message.to_typed()?, &order.signature)?;

        let delta = match order.side {
            OrderSide::Buy => size.inner(),
            OrderSide::Sell => -size.inner(),
        };
        *state
            .positions
            .entry((account.clone(), order.market.clone()))
            .or_default() += delta;
        state.submissions.push((account, order.clone()));
        state.next_order_id += 1;
        Ok(OrderAck {
            id: Some(state.next_order_id.to_string()),
            status: Some("NEW".to_string()),
        })
    }
}

impl ExchangeApi for MockExchange {
    fn fetch_system_config(&self) -> BoxFuture<'_, RegistryResult<SystemConfig>> {
        Box::pin(async move {
            self.state
                .lock()
                .system_config
                .clone()
                .ok_or(RegistryError::Http {
                    status: 503,
                    body: "system config unavailable".to_string(),
                })
        })
    }

    fn authenticate(&self, headers: AuthHeaders) -> BoxFuture<'_, RegistryResult<String>> {
        Box::pin(async move { self.handle_auth(&headers) })
    }

    fn submit_order(
        &self,
        token: String,
        order: OrderRequest,
    ) -> BoxFuture<'_, RegistryResult<OrderAck>> {
        Box::pin(async move { self.handle_submit(&token, &order) })
    }

    fn cancel_all_orders(&self, token: String) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            let account = Self::account_for_token(&state, &token)?;
            state.cancels.push(account);
            Ok(())
        })
    }

    fn fetch_positions(&self, token: String) -> BoxFuture<'_, RegistryResult<Vec<PositionEntry>>> {
        Box::pin(async move {
            let state = self.state.lock();
            let account = Self::account_for_token(&state, &token)?;
            let mut entries: Vec<PositionEntry> = state
                .positions
                .iter()
                .filter(|((owner, _), size)| *owner == account && !size.is_zero())
                .map(|((_, market), size)| PositionEntry {
                    market: market.clone(),
                    side: if size.is_sign_positive() {
                        PositionSide::Long
                    } else {
                        PositionSide::Short
                    },
                    size: Size::new(*size),
                    status: PositionStatus::Open,
                })
                .collect();
            entries.sort_by(|a, b| a.market.cmp(&b.market));
            Ok(entries)
        })
    }

    fn fetch_balance(&self, token: String) -> BoxFuture<'_, RegistryResult<Vec<BalanceEntry>>> {
        Box::pin(async move {
            let state = self.state.lock();
            let account = Self::account_for_token(&state, &token)?;
            let size = state.balances.get(&account).copied().unwrap_or_default();
            Ok(vec![BalanceEntry {
                token: MOCK_COLLATERAL_TOKEN.to_string(),
                size,
            }])
        })
    }

    fn fetch_bbo(&self, symbol: String) -> BoxFuture<'_, RegistryResult<Bbo>> {
        Box::pin(async move {
            self.state
                .lock()
                .bbo
                .get(&symbol)
                .copied()
                .ok_or(RegistryError::Http {
                    status: 404,
                    body: format!("no bbo for {symbol}"),
                })
        })
    }

    fn fetch_markets(&self) -> BoxFuture<'_, RegistryResult<Vec<Market>>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            state.markets_fetch_count += 1;
            Ok(state.markets.clone())
        })
    }
}

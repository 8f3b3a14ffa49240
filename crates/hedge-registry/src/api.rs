//! Exchange service trait and its wire types.
//!
//! The core only talks to the exchange through [`ExchangeApi`]. Methods return
//! boxed futures so the trait stays dyn-compatible and can be shared as
//! [`DynExchangeApi`].

use std::pin::Pin;
use std::sync::Arc;

use hedge_core::{Bbo, Market, OrderSide, OrderType, PositionSide, Price, Size};
use hedge_signer::felt::{encode_short_string, felt_from_str};
use hedge_signer::{DerivationParams, Felt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RegistryError, RegistryResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Request/response service for the exchange.
///
/// Token-bearing calls take the account's bearer token.
pub trait ExchangeApi: Send + Sync {
    fn fetch_system_config(&self) -> BoxFuture<'_, RegistryResult<SystemConfig>>;

    /// Exchange a signed auth challenge for a JWT.
    fn authenticate(&self, headers: AuthHeaders) -> BoxFuture<'_, RegistryResult<String>>;

    fn submit_order(
        &self,
        token: String,
        order: OrderRequest,
    ) -> BoxFuture<'_, RegistryResult<OrderAck>>;

    fn cancel_all_orders(&self, token: String) -> BoxFuture<'_, RegistryResult<()>>;

    fn fetch_positions(&self, token: String) -> BoxFuture<'_, RegistryResult<Vec<PositionEntry>>>;

    fn fetch_balance(&self, token: String) -> BoxFuture<'_, RegistryResult<Vec<BalanceEntry>>>;

    fn fetch_bbo(&self, symbol: String) -> BoxFuture<'_, RegistryResult<Bbo>>;

    fn fetch_markets(&self) -> BoxFuture<'_, RegistryResult<Vec<Market>>>;
}

/// Shared handle to an exchange implementation.
pub type DynExchangeApi = Arc<dyn ExchangeApi>;

/// `GET system/config` response (subset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// StarkNet chain name, e.g. "PRIVATE_SN_POTC_SEPOLIA".
    pub starknet_chain_id: String,
    /// Ethereum chain id as a decimal string.
    pub l1_chain_id: String,
    pub paraclear_account_proxy_hash: String,
    pub paraclear_account_hash: String,
}

impl SystemConfig {
    /// Chain id felt used in the StarkNet signing domain.
    pub fn starknet_chain_felt(&self) -> RegistryResult<Felt> {
        Ok(encode_short_string(&self.starknet_chain_id)?)
    }

    /// Parameters for deriving accounts on this deployment.
    pub fn derivation_params(&self) -> RegistryResult<DerivationParams> {
        let l1_chain_id = self.l1_chain_id.trim().parse::<u64>().map_err(|e| {
            RegistryError::InvalidConfig(format!("l1_chain_id {:?}: {e}", self.l1_chain_id))
        })?;
        Ok(DerivationParams {
            l1_chain_id,
            account_proxy_hash: felt_from_str(&self.paraclear_account_proxy_hash)?,
            account_class_hash: felt_from_str(&self.paraclear_account_hash)?,
        })
    }
}

/// Signed authentication challenge, sent as `PARADEX-*` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// Account address, `0x` hex.
    pub account: String,
    /// `["r","s"]` decimal signature.
    pub signature: String,
    pub timestamp: u64,
    pub expiration: u64,
}

impl AuthHeaders {
    pub const ACCOUNT: &'static str = "PARADEX-STARKNET-ACCOUNT";
    pub const SIGNATURE: &'static str = "PARADEX-STARKNET-SIGNATURE";
    pub const TIMESTAMP: &'static str = "PARADEX-TIMESTAMP";
    pub const EXPIRATION: &'static str = "PARADEX-SIGNATURE-EXPIRATION";

    /// Header name/value pairs in request order.
    pub fn to_pairs(&self) -> [(&'static str, String); 4] {
        [
            (Self::ACCOUNT, self.account.clone()),
            (Self::SIGNATURE, self.signature.clone()),
            (Self::TIMESTAMP, self.timestamp.to_string()),
            (Self::EXPIRATION, self.expiration.to_string()),
        ]
    }
}

/// `POST orders` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub market: String,
    pub side: OrderSide,
    /// Decimal size as a string.
    pub size: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub client_id: String,
    pub instruction: String,
    /// `["r","s"]` decimal signature.
    pub signature: String,
    /// Unix milliseconds; the signed nonce.
    pub signature_timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

/// `POST orders` response (subset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Lifecycle status of a reported position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

/// Entry of `GET positions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub market: String,
    pub side: PositionSide,
    /// Signed for shorts on some deployments; use `abs` when closing.
    pub size: Size,
    pub status: PositionStatus,
}

impl PositionEntry {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

/// Decode `GET positions` entries one by one; malformed entries are logged and
/// dropped so the rest of the snapshot stays usable.
pub(crate) fn decode_positions(raw: Vec<serde_json::Value>) -> Vec<PositionEntry> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<PositionEntry>(value.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(entry = %value, error = %e, "Skipping undecodable position");
                None
            }
        })
        .collect()
}

/// Entry of `GET balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub token: String,
    pub size: Decimal,
}

/// `GET bbo/{symbol}` response.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct BboResponse {
    pub bid: Price,
    pub ask: Price,
}

impl From<BboResponse> for Bbo {
    fn from(raw: BboResponse) -> Self {
        Bbo::new(raw.bid, raw.ask)
    }
}

/// `{"results": [...]}` envelope of list endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Results<T> {
    pub results: Vec<T>,
}

/// `POST auth` response.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub jwt_token: String,
}

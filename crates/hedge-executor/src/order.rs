//! Signed order construction.

use std::sync::Arc;

use hedge_core::{Clock, OrderSide, OrderType, Size};
use hedge_registry::OrderRequest;
use hedge_signer::{HedgeAccount, OrderMessage, StarkDomain, StarkSignature};

use crate::error::{ExecutorError, ExecutorResult};
use crate::nonce::NonceManager;

/// Time-in-force sent with every order.
pub const INSTRUCTION_GTC: &str = "GTC";

/// Order with its StarkNet signature. Immutable once signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    message: OrderMessage,
    signature: StarkSignature,
}

impl SignedOrder {
    pub fn market(&self) -> &str {
        &self.message.market
    }

    pub fn side(&self) -> OrderSide {
        self.message.side
    }

    pub fn size(&self) -> Size {
        self.message.size
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.message.timestamp_ms
    }

    /// REST body for `POST orders`.
    pub fn to_request(&self) -> OrderRequest {
        OrderRequest {
            market: self.message.market.clone(),
            side: self.message.side,
            size: self.message.size.to_wire(),
            order_type: self.message.order_type,
            client_id: String::new(),
            instruction: INSTRUCTION_GTC.to_string(),
            signature: self.signature.to_wire(),
            signature_timestamp: self.message.timestamp_ms,
            price: self
                .message
                .price
                .map(|p| p.inner().normalize().to_string()),
        }
    }
}

/// Signs orders under the exchange domain with monotonic timestamps.
pub struct OrderSigner {
    domain: StarkDomain,
    nonces: NonceManager,
}

impl OrderSigner {
    pub fn new(domain: StarkDomain, clock: Arc<dyn Clock>) -> Self {
        Self {
            domain,
            nonces: NonceManager::new(clock),
        }
    }

    /// Sign a market order for `account`.
    ///
    /// # Errors
    /// `InvalidOrder` for a non-positive size; `Signing` if the market symbol
    /// cannot be felt-encoded.
    pub fn market_order(
        &self,
        account: &HedgeAccount,
        market: &str,
        side: OrderSide,
        size: Size,
    ) -> ExecutorResult<SignedOrder> {
        if !size.is_positive() {
            return Err(ExecutorError::InvalidOrder(format!(
                "{market} {side} size {size} must be positive"
            )));
        }
        let message = OrderMessage {
            timestamp_ms: self.nonces.next(),
            market: market.to_string(),
            side,
            order_type: OrderType::Market,
            size,
            price: None,
        };
        let signature = account.sign_message(&self.domain, &message.to_typed()?)?;
        Ok(SignedOrder { message, signature })
    }
}

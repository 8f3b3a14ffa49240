//! Canonical messages signed by managed accounts.
//!
//! - `Constant`: EIP-712 seed message signed by the Ethereum key (key derivation)
//! - `Request`: StarkNet auth challenge exchanged for a bearer token
//! - `Order`: StarkNet order payload; the timestamp doubles as the nonce

use crate::error::SignerResult;
use crate::felt::{encode_short_string, felt_from_str};
use crate::typed_data::{StarkDomain, TypedStruct};
use alloy::primitives::U256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol;
use alloy::sol_types::{eip712_domain, SolStruct};
use hedge_core::{OrderSide, OrderType, Price, Size};
use starknet_types_core::felt::Felt;

/// Domain name shared by the seed message and StarkNet messages.
pub const DOMAIN_NAME: &str = "Paradex";
pub const DOMAIN_VERSION: &str = "1";

/// Action string of the key-derivation seed message.
pub const STARK_KEY_ACTION: &str = "STARK Key";

pub const AUTH_METHOD: &str = "POST";
pub const AUTH_PATH: &str = "/v1/auth";

sol! {
    #[derive(Debug)]
    struct Constant {
        string action;
    }
}

/// Sign the seed message with the Ethereum key and return the signature's `r`.
///
/// Domain: `{name: "Paradex", version: "1", chainId: l1_chain_id}`.
pub fn stark_key_seed(signer: &PrivateKeySigner, l1_chain_id: u64) -> SignerResult<U256> {
    let domain = eip712_domain! {
        name: DOMAIN_NAME,
        version: DOMAIN_VERSION,
        chain_id: l1_chain_id,
    };

    let constant = Constant {
        action: STARK_KEY_ACTION.to_string(),
    };

    // keccak256(0x1901 || domain_separator || struct_hash)
    let signing_hash = constant.eip712_signing_hash(&domain);
    let signature = signer.sign_hash_sync(&signing_hash)?;
    Ok(signature.r())
}

/// Paradex StarkNet domain for a chain id.
pub fn paradex_domain(starknet_chain_id: Felt) -> StarkDomain {
    StarkDomain::new(DOMAIN_NAME, starknet_chain_id, DOMAIN_VERSION)
}

/// Authentication challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequest {
    /// Unix seconds.
    pub timestamp: u64,
    /// Unix seconds.
    pub expiration: u64,
}

impl AuthRequest {
    /// Session lifetime requested from the auth endpoint.
    pub const VALIDITY_SECS: u64 = 24 * 60 * 60;

    pub fn new(now_secs: u64) -> Self {
        Self {
            timestamp: now_secs,
            expiration: now_secs + Self::VALIDITY_SECS,
        }
    }

    pub fn to_typed(&self) -> SignerResult<TypedStruct> {
        Ok(TypedStruct::new("Request")
            .field("method", encode_short_string(AUTH_METHOD)?)
            .field("path", encode_short_string(AUTH_PATH)?)
            .field("body", felt_from_str("")?)
            .field("timestamp", Felt::from(self.timestamp))
            .field("expiration", Felt::from(self.expiration)))
    }
}

/// Order fields covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMessage {
    /// Unix milliseconds; acts as the nonce.
    pub timestamp_ms: u64,
    pub market: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub size: Size,
    /// `None` for market orders (signed as 0).
    pub price: Option<Price>,
}

impl OrderMessage {
    pub fn to_typed(&self) -> SignerResult<TypedStruct> {
        let price = match self.price {
            Some(price) => price.to_chain_quantum()?,
            None => 0,
        };
        Ok(TypedStruct::new("Order")
            .field("timestamp", Felt::from(self.timestamp_ms))
            .field("market", felt_from_str(&self.market)?)
            .field("side", Felt::from(self.side.chain_value()))
            .field("orderType", encode_short_string(self.order_type.as_wire())?)
            .field("size", Felt::from(self.size.to_chain_quantum()?))
            .field("price", Felt::from(price)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::felt::felt_to_hex;
    use rust_decimal_macros::dec;

    const TEST_ETH_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_auth_request_expiration() {
        let req = AuthRequest::new(1_700_000_000);
        assert_eq!(req.expiration - req.timestamp, 86_400);
    }

    #[test]
    fn test_auth_request_layout() {
        let typed = AuthRequest::new(1_700_000_000).to_typed().unwrap();
        assert_eq!(
            typed.encode_type(),
            "Request(method:felt,path:felt,body:felt,timestamp:felt,expiration:felt)"
        );
        assert_eq!(
            felt_to_hex(&typed.type_hash()),
            "0x186cdef6b179923c411c13c11b8a825f12bf34203bdda0a984da9d6f2313c2"
        );
        assert_eq!(typed.fields()[0].1, Felt::from(0x504f5354u64));
        assert_eq!(typed.fields()[2].1, Felt::ZERO);
        assert_eq!(typed.fields()[4].1, Felt::from(1_700_086_400u64));
    }

    #[test]
    fn test_order_message_layout() {
        let msg = OrderMessage {
            timestamp_ms: 1_700_000_000_123,
            market: "ETH-USD-PERP".to_string(),
            side: OrderSide::Sell,
            order_type: OrderType::Market,
            size: Size::new(dec!(0.05)),
            price: None,
        };
        let typed = msg.to_typed().unwrap();
        assert_eq!(
            typed.encode_type(),
            "Order(timestamp:felt,market:felt,side:felt,orderType:felt,size:felt,price:felt)"
        );
        assert_eq!(
            felt_to_hex(&typed.type_hash()),
            "0xa56d5225b97b257c15ae2cb1cc0ea605381a886cd75463db45fd2ef9fbc255"
        );
        let values: Vec<Felt> = typed.fields().iter().map(|(_, v)| *v).collect();
        assert_eq!(values[0], Felt::from(1_700_000_000_123u64));
        assert_eq!(values[1], encode_short_string("ETH-USD-PERP").unwrap());
        assert_eq!(values[2], Felt::from(2u64));
        assert_eq!(values[3], encode_short_string("MARKET").unwrap());
        assert_eq!(values[4], Felt::from(5_000_000u64));
        assert_eq!(values[5], Felt::ZERO);
    }

    fn sepolia_domain() -> StarkDomain {
        paradex_domain(encode_short_string("PRIVATE_SN_POTC_SEPOLIA").unwrap())
    }

    #[test]
    fn test_auth_message_hash_vector() {
        let typed = AuthRequest::new(1_700_000_000).to_typed().unwrap();
        let hash = sepolia_domain()
            .message_hash(Felt::from(0x1234abcdu64), &typed)
            .unwrap();
        assert_eq!(
            felt_to_hex(&hash),
            "0x5bb071c33472ff5ff9c2599cbcaf5708219ce8639cfd8ac025da2af6fb3d5af"
        );
    }

    #[test]
    fn test_order_message_hash_vector() {
        let msg = OrderMessage {
            timestamp_ms: 1_700_000_000_123,
            market: "ETH-USD-PERP".to_string(),
            side: OrderSide::Sell,
            order_type: OrderType::Market,
            size: Size::new(dec!(0.05)),
            price: None,
        };
        let hash = sepolia_domain()
            .message_hash(Felt::from(0x1234abcdu64), &msg.to_typed().unwrap())
            .unwrap();
        assert_eq!(
            felt_to_hex(&hash),
            "0x6bb0fe6f1981a9c85544d19bbb6baac6e507566a4de7caddf685131cefa5236"
        );
    }

    #[test]
    fn test_limit_order_price_quantum() {
        let msg = OrderMessage {
            timestamp_ms: 1,
            market: "BTC-USD-PERP".to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            size: Size::new(dec!(1)),
            price: Some(Price::new(dec!(2000.123456789))),
        };
        let typed = msg.to_typed().unwrap();
        assert_eq!(typed.fields()[5].1, Felt::from(200_012_345_678u64));
    }

    #[test]
    fn test_stark_key_seed_is_deterministic() {
        let signer: PrivateKeySigner = TEST_ETH_KEY.parse().unwrap();
        let a = stark_key_seed(&signer, 1).unwrap();
        let b = stark_key_seed(&signer, 1).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, stark_key_seed(&signer, 11_155_111).unwrap());
    }
}

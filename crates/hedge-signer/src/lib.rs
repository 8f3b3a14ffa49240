//! StarkNet key derivation and typed-data signing for Paradex accounts.
//!
//! Each managed account starts from an Ethereum private key. The StarkNet
//! signing key is derived from it in two stages:
//! 1. Sign the EIP-712 "STARK Key" constant with the Ethereum key
//! 2. Grind the signature's `r` into the STARK curve order
//!
//! The derived key then signs StarkNet typed data (auth requests and
//! orders) hashed with Pedersen over felt-encoded fields.

pub mod account;
pub mod error;
pub mod felt;
pub mod grind;
pub mod keys;
pub mod messages;
pub mod typed_data;

pub use account::{DerivationParams, HedgeAccount, StarkKeyPair, StarkSignature};
pub use error::{SignerError, SignerResult};
pub use grind::{grind_key, STARK_CURVE_ORDER};
pub use keys::{load_eth_keys, KeyError, KeySource};
pub use messages::{
    paradex_domain, stark_key_seed, AuthRequest, OrderMessage, AUTH_PATH, DOMAIN_NAME,
    DOMAIN_VERSION,
};
pub use starknet_types_core::felt::Felt;
pub use typed_data::{StarkDomain, TypedStruct};

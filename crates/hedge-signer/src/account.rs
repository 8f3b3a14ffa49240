//! Account key material: derivation, address computation and signing.

use std::fmt;

use alloy::signers::local::PrivateKeySigner;
use hedge_core::AccountId;
use starknet_crypto::{get_public_key, rfc6979_generate_k, sign, SignError};
use starknet_types_core::felt::Felt;
use tracing::debug;

use crate::error::{SignerError, SignerResult};
use crate::felt::{
    encode_short_string, felt_from_u256, felt_to_decimal, felt_to_hex, felt_to_u256,
    pedersen_array, selector_from_name,
};
use crate::grind::{grind_key, STARK_CURVE_ORDER};
use crate::messages::stark_key_seed;
use crate::typed_data::{StarkDomain, TypedStruct};
use alloy::primitives::{uint, U256};

/// Contract addresses are reduced into `[0, 2^251 - 256)`.
const L2_ADDRESS_UPPER_BOUND: U256 =
    uint!(0x7ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff00_U256);

/// Parameters for deriving an account from an Ethereum key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationParams {
    /// Ethereum chain id used in the seed message domain.
    pub l1_chain_id: u64,
    /// Class hash of the account proxy contract.
    pub account_proxy_hash: Felt,
    /// Class hash of the account implementation.
    pub account_class_hash: Felt,
}

/// StarkNet key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct StarkKeyPair {
    private_key: Felt,
    public_key: Felt,
}

impl StarkKeyPair {
    pub fn from_private_key(private_key: Felt) -> Self {
        Self {
            public_key: get_public_key(&private_key),
            private_key,
        }
    }

    /// Derive from an Ethereum key: sign the seed message, grind its `r`.
    pub fn derive(eth_signer: &PrivateKeySigner, l1_chain_id: u64) -> SignerResult<Self> {
        let seed = stark_key_seed(eth_signer, l1_chain_id)?;
        let private_key = felt_from_u256(grind_key(seed, STARK_CURVE_ORDER));
        Ok(Self::from_private_key(private_key))
    }

    pub fn public_key(&self) -> Felt {
        self.public_key
    }

    /// ECDSA over the STARK curve with an RFC-6979 nonce.
    pub fn sign_hash(&self, hash: &Felt) -> SignerResult<StarkSignature> {
        let mut seed: Option<Felt> = None;
        loop {
            let k = rfc6979_generate_k(hash, &self.private_key, seed.as_ref());
            match sign(&self.private_key, hash, &k) {
                Ok(signature) => {
                    return Ok(StarkSignature {
                        r: signature.r,
                        s: signature.s,
                    })
                }
                Err(SignError::InvalidK) => {
                    seed = Some(seed.unwrap_or(Felt::ZERO) + Felt::ONE);
                }
                Err(e) => return Err(SignerError::StarkSigning(format!("{e:?}"))),
            }
        }
    }
}

impl fmt::Debug for StarkKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StarkKeyPair")
            .field("public_key", &felt_to_hex(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// Two-element STARK signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarkSignature {
    pub r: Felt,
    pub s: Felt,
}

impl StarkSignature {
    /// `["<r>","<s>"]` with decimal components, as sent in headers and order bodies.
    pub fn to_wire(&self) -> String {
        format!(
            "[\"{}\",\"{}\"]",
            felt_to_decimal(&self.r),
            felt_to_decimal(&self.s)
        )
    }
}

/// Counterfactual address of the account contract deployed for `public_key`.
///
/// Deployer is zero, salt is the public key, constructor calldata initialises
/// the proxy with the implementation class and the key.
pub fn compute_account_address(public_key: Felt, params: &DerivationParams) -> SignerResult<Felt> {
    let calldata = [
        params.account_class_hash,
        selector_from_name("initialize"),
        Felt::from(2u64),
        public_key,
        Felt::ZERO,
    ];
    let raw = pedersen_array(&[
        encode_short_string("STARKNET_CONTRACT_ADDRESS")?,
        Felt::ZERO,
        public_key,
        params.account_proxy_hash,
        pedersen_array(&calldata),
    ]);
    Ok(felt_from_u256(felt_to_u256(&raw) % L2_ADDRESS_UPPER_BOUND))
}

/// A managed exchange account: address plus signing keys.
#[derive(Clone)]
pub struct HedgeAccount {
    id: AccountId,
    address: Felt,
    keys: StarkKeyPair,
}

impl HedgeAccount {
    /// Derive the full account from an Ethereum key.
    pub fn derive(eth_signer: &PrivateKeySigner, params: &DerivationParams) -> SignerResult<Self> {
        let keys = StarkKeyPair::derive(eth_signer, params.l1_chain_id)?;
        let account = Self::from_keys(keys, params)?;
        debug!(
            eth_address = %eth_signer.address(),
            account = %account.id,
            "Derived account"
        );
        Ok(account)
    }

    pub fn from_keys(keys: StarkKeyPair, params: &DerivationParams) -> SignerResult<Self> {
        let address = compute_account_address(keys.public_key(), params)?;
        Ok(Self {
            id: AccountId::from_hex(&felt_to_hex(&address)),
            address,
            keys,
        })
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn address(&self) -> Felt {
        self.address
    }

    pub fn public_key(&self) -> Felt {
        self.keys.public_key()
    }

    /// Sign a typed message under `domain` on behalf of this account.
    pub fn sign_message(
        &self,
        domain: &StarkDomain,
        message: &TypedStruct,
    ) -> SignerResult<StarkSignature> {
        let hash = domain.message_hash(self.address, message)?;
        self.keys.sign_hash(&hash)
    }
}

impl fmt::Debug for HedgeAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HedgeAccount")
            .field("id", &self.id)
            .field("keys", &self.keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::paradex_domain;
    use starknet_crypto::verify;

    const TEST_ETH_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn params() -> DerivationParams {
        DerivationParams {
            l1_chain_id: 11_155_111,
            account_proxy_hash: Felt::from(0x1234u64),
            account_class_hash: Felt::from(0x5678u64),
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let signer: PrivateKeySigner = TEST_ETH_KEY.parse().unwrap();
        let a = HedgeAccount::derive(&signer, &params()).unwrap();
        let b = HedgeAccount::derive(&signer, &params()).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_derived_private_key_below_curve_order() {
        let signer: PrivateKeySigner = TEST_ETH_KEY.parse().unwrap();
        let keys = StarkKeyPair::derive(&signer, 1).unwrap();
        assert!(felt_to_u256(&keys.private_key) < STARK_CURVE_ORDER);
    }

    #[test]
    fn test_address_below_upper_bound() {
        let keys = StarkKeyPair::from_private_key(Felt::from(42u64));
        let address = compute_account_address(keys.public_key(), &params()).unwrap();
        assert!(felt_to_u256(&address) < L2_ADDRESS_UPPER_BOUND);
    }

    #[test]
    fn test_public_key_and_address_vectors() {
        let keys = StarkKeyPair::from_private_key(Felt::from(0xdeadbeefu64));
        assert_eq!(
            felt_to_hex(&keys.public_key()),
            "0x5eeb3e0d88756352e5b7015667431490b631ea109bb6e31d65bb3bef604c186"
        );
        assert_eq!(
            felt_to_hex(&selector_from_name("initialize")),
            "0x79dc0da7c54b95f10aa182ad0a46400db63156920adb65eca2654c0945a463"
        );

        let account = HedgeAccount::from_keys(keys, &params()).unwrap();
        assert_eq!(
            felt_to_hex(&account.address()),
            "0x6d7b6deb2fc1d4d7b5984ac6a90c85c0fa3f1c844ecbac212508aef9e943b04"
        );
    }

    #[test]
    fn test_signature_verifies() {
        let keys = StarkKeyPair::from_private_key(Felt::from(0xdeadbeefu64));
        let account = HedgeAccount::from_keys(keys, &params()).unwrap();
        let domain = paradex_domain(Felt::from(7u64));
        let message = TypedStruct::new("T").field("x", Felt::from(1u64));

        let signature = account.sign_message(&domain, &message).unwrap();
        let hash = domain.message_hash(account.address(), &message).unwrap();
        assert!(verify(&account.public_key(), &hash, &signature.r, &signature.s).unwrap());
    }

    #[test]
    fn test_signature_is_deterministic() {
        let keys = StarkKeyPair::from_private_key(Felt::from(0xdeadbeefu64));
        let hash = Felt::from(12345u64);
        assert_eq!(keys.sign_hash(&hash).unwrap(), keys.sign_hash(&hash).unwrap());
    }

    #[test]
    fn test_signature_wire_format() {
        let sig = StarkSignature {
            r: Felt::from(1u64),
            s: Felt::from(255u64),
        };
        assert_eq!(sig.to_wire(), r#"["1","255"]"#);
    }

    #[test]
    fn test_debug_hides_private_key() {
        let keys = StarkKeyPair::from_private_key(Felt::from(0xdeadbeefu64));
        let rendered = format!("{keys:?}");
        assert!(!rendered.contains("deadbeef"));
        assert!(!rendered.contains("3735928559"));
    }
}

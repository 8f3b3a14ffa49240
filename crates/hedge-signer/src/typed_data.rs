//! StarkNet typed-data hashing (legacy `StarkNetDomain` revision).
//!
//! Every struct used by the exchange has only `felt` members, so a struct is
//! modelled as an ordered list of `(name, value)` pairs. Field order is part of
//! the type hash; reordering a field changes every signature.
//!
//! ```text
//! type_hash   = sn_keccak("Name(f1:felt,f2:felt,...)")
//! struct_hash = pedersen_array([type_hash, v1, v2, ...])
//! message     = pedersen_array(["StarkNet Message", domain_hash, account, struct_hash])
//! ```

use crate::error::SignerResult;
use crate::felt::{encode_short_string, felt_from_str, pedersen_array, starknet_keccak};
use starknet_types_core::felt::Felt;

/// Prefix mixed into every message hash.
const MESSAGE_PREFIX: &str = "StarkNet Message";

/// A typed-data struct whose members are all felts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedStruct {
    name: &'static str,
    fields: Vec<(&'static str, Felt)>,
}

impl TypedStruct {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Append a member. Call order defines the type's field order.
    pub fn field(mut self, name: &'static str, value: Felt) -> Self {
        self.fields.push((name, value));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[(&'static str, Felt)] {
        &self.fields
    }

    /// `Name(a:felt,b:felt)`.
    pub fn encode_type(&self) -> String {
        let members: Vec<String> = self
            .fields
            .iter()
            .map(|(name, _)| format!("{name}:felt"))
            .collect();
        format!("{}({})", self.name, members.join(","))
    }

    pub fn type_hash(&self) -> Felt {
        starknet_keccak(self.encode_type().as_bytes())
    }

    pub fn struct_hash(&self) -> Felt {
        let mut elements = Vec::with_capacity(self.fields.len() + 1);
        elements.push(self.type_hash());
        elements.extend(self.fields.iter().map(|(_, value)| *value));
        pedersen_array(&elements)
    }
}

/// Signing domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarkDomain {
    pub name: String,
    pub chain_id: Felt,
    pub version: String,
}

impl StarkDomain {
    pub fn new(name: impl Into<String>, chain_id: Felt, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain_id,
            version: version.into(),
        }
    }

    /// The domain as a `StarkNetDomain(name,chainId,version)` struct.
    pub fn as_struct(&self) -> SignerResult<TypedStruct> {
        Ok(TypedStruct::new("StarkNetDomain")
            .field("name", felt_from_str(&self.name)?)
            .field("chainId", self.chain_id)
            .field("version", felt_from_str(&self.version)?))
    }

    /// Final hash signed by `account` for `message`.
    pub fn message_hash(&self, account: Felt, message: &TypedStruct) -> SignerResult<Felt> {
        let domain_hash = self.as_struct()?.struct_hash();
        Ok(pedersen_array(&[
            encode_short_string(MESSAGE_PREFIX)?,
            domain_hash,
            account,
            message.struct_hash(),
        ]))
    }
}

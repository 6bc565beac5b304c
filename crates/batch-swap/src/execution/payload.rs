//! Typed-data payload builder.
//!
//! Pure: turns an ordered list of (token, amount) pairs plus a deadline into
//! the EIP-712 domain, type schema and `BatchSwap` message the wallet signs.

use std::borrow::Cow;

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde_json::{json, Value};

use crate::constants::{EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION, PRIMARY_TYPE};
use crate::errors::SwapError;
use crate::execution::contracts::BatchSwap;
use crate::types::SwapInput;

/// One named field of an EIP-712 struct type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeField {
    pub name: &'static str,
    pub ty: &'static str,
}

/// Declared EIP-712 struct type, as handed to wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSchema {
    pub primary_type: &'static str,
    pub fields: &'static [TypeField],
}

/// The `BatchSwap` schema. Order and names are part of the signed digest.
pub const BATCH_SWAP_SCHEMA: TypeSchema = TypeSchema {
    primary_type: PRIMARY_TYPE,
    fields: &[
        TypeField {
            name: "tokens",
            ty: "address[]",
        },
        TypeField {
            name: "amounts",
            ty: "uint256[]",
        },
        TypeField {
            name: "deadline",
            ty: "uint256",
        },
    ],
};

impl TypeSchema {
    /// EIP-712 `encodeType` string, e.g. `BatchSwap(address[] tokens,...)`.
    pub fn encode_type(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{} {}", f.ty, f.name))
            .collect();
        format!("{}({})", self.primary_type, fields.join(","))
    }

    fn to_json(self) -> Value {
        Value::Array(
            self.fields
                .iter()
                .map(|f| json!({ "name": f.name, "type": f.ty }))
                .collect(),
        )
    }
}

/// Everything a wallet needs to sign a batch swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Payload {
    pub domain: Eip712Domain,
    pub schema: TypeSchema,
    pub message: BatchSwap,
}

impl Eip712Payload {
    /// The EIP-712 digest: `keccak256(0x1901 || domainSeparator || hashStruct(message))`.
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }

    /// Render as an `eth_signTypedData_v4` request body.
    ///
    /// Integers are rendered as decimal strings so wallets never see lossy
    /// JSON numbers.
    pub fn to_typed_data_json(&self) -> Value {
        let chain_id = self.domain.chain_id.map(|id| id.to_string());
        let verifying_contract = self.domain.verifying_contract.map(|a| a.to_checksum(None));
        json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" },
                ],
                (self.schema.primary_type): self.schema.to_json(),
            },
            "primaryType": self.schema.primary_type,
            "domain": {
                "name": self.domain.name.as_deref(),
                "version": self.domain.version.as_deref(),
                "chainId": chain_id,
                "verifyingContract": verifying_contract,
            },
            "message": {
                "tokens": self.message.tokens.iter().map(|t| t.to_checksum(None)).collect::<Vec<_>>(),
                "amounts": self.message.amounts.iter().map(U256::to_string).collect::<Vec<_>>(),
                "deadline": self.message.deadline.to_string(),
            },
        })
    }
}

/// Build the signing domain for a deployment.
pub fn signing_domain(chain_id: u64, verifying_contract: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(EIP712_DOMAIN_NAME)),
        Some(Cow::Borrowed(EIP712_DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(verifying_contract),
        None,
    )
}

/// Build the canonical EIP-712 payload for a batch swap.
///
/// `tokens[i]` and `amounts[i]` must describe the same swap; the order is
/// preserved exactly. Fails with `SwapError::Validation` when the sequences
/// are empty or differ in length. The deadline is not checked against the
/// clock here; the contract enforces it.
pub fn build_payload(
    tokens: &[Address],
    amounts: &[U256],
    deadline: U256,
    chain_id: u64,
    verifying_contract: Address,
) -> Result<Eip712Payload, SwapError> {
    if tokens.len() != amounts.len() {
        return Err(SwapError::Validation(format!(
            "tokens/amounts length mismatch: {} tokens, {} amounts",
            tokens.len(),
            amounts.len()
        )));
    }
    if tokens.is_empty() {
        return Err(SwapError::Validation("batch must contain at least one token".into()));
    }

    Ok(Eip712Payload {
        domain: signing_domain(chain_id, verifying_contract),
        schema: BATCH_SWAP_SCHEMA,
        message: BatchSwap {
            tokens: tokens.to_vec(),
            amounts: amounts.to_vec(),
            deadline,
        },
    })
}

/// [`build_payload`] over a slice of [`SwapInput`]s.
pub fn build_payload_for_inputs(
    inputs: &[SwapInput],
    deadline: U256,
    chain_id: u64,
    verifying_contract: Address,
) -> Result<Eip712Payload, SwapError> {
    let (tokens, amounts): (Vec<Address>, Vec<U256>) =
        inputs.iter().map(|i| (i.token_in, i.amount_in)).unzip();
    build_payload(&tokens, &amounts, deadline, chain_id, verifying_contract)
}

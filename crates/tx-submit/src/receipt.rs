use alloy_primitives::{Address, B256, U256};
use serde_json::Value;

use crate::error::SubmitError;

/// Execution outcome reported in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Failed,
    /// Pre-Byzantium receipts carry no status field.
    Unknown,
}

/// A mined transaction's receipt, reduced to the fields callers act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_hash: Option<B256>,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub contract_address: Option<Address>,
    pub status: ReceiptStatus,
}

impl Receipt {
    /// Parses a `*_getTransactionReceipt` result object.
    pub fn from_json(value: &Value) -> Result<Self, SubmitError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SubmitError::InvalidResponse(format!("receipt is not an object: {value}")))?;

        let transaction_hash = match obj.get("transactionHash").and_then(Value::as_str) {
            Some(s) => parse_b256(s)?,
            None => {
                return Err(SubmitError::InvalidResponse(
                    "receipt missing transactionHash".into(),
                ))
            }
        };

        let status = match opt_str(obj.get("status")) {
            None => ReceiptStatus::Unknown,
            Some(s) => match parse_hex_u64(s)? {
                0 => ReceiptStatus::Failed,
                1 => ReceiptStatus::Success,
                other => {
                    return Err(SubmitError::InvalidResponse(format!(
                        "unexpected receipt status {other}"
                    )))
                }
            },
        };

        Ok(Self {
            transaction_hash,
            block_hash: opt_str(obj.get("blockHash")).map(parse_b256).transpose()?,
            block_number: opt_str(obj.get("blockNumber")).map(parse_hex_u64).transpose()?,
            gas_used: opt_str(obj.get("gasUsed")).map(parse_hex_u256).transpose()?,
            contract_address: opt_str(obj.get("contractAddress"))
                .map(parse_address)
                .transpose()?,
            status,
        })
    }
}

fn opt_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

pub(crate) fn parse_b256(input: &str) -> Result<B256, SubmitError> {
    input
        .parse::<B256>()
        .map_err(|e| SubmitError::InvalidResponse(format!("invalid hash '{input}': {e}")))
}

/// Accepts hex (`0x...`) or Bech32 (`lat1...`), the form PlatON nodes
/// report.
fn parse_address(input: &str) -> Result<Address, SubmitError> {
    if input.starts_with("0x") || input.starts_with("0X") {
        return input
            .parse::<Address>()
            .map_err(|e| SubmitError::InvalidResponse(format!("invalid address '{input}': {e}")));
    }

    let (_, payload) = chain_platon::bech32::decode(input)
        .map_err(|e| SubmitError::InvalidResponse(format!("invalid address '{input}': {e}")))?;
    if payload.len() != 20 {
        return Err(SubmitError::InvalidResponse(format!(
            "invalid address '{input}': {} payload bytes",
            payload.len()
        )));
    }
    Ok(Address::from_slice(&payload))
}

fn parse_hex_u64(input: &str) -> Result<u64, SubmitError> {
    let value = strip_hex_prefix(input);
    if value.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(value, 16)
        .map_err(|e| SubmitError::InvalidResponse(format!("invalid quantity '{input}': {e}")))
}

fn parse_hex_u256(input: &str) -> Result<U256, SubmitError> {
    let value = strip_hex_prefix(input);
    if value.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(value, 16)
        .map_err(|e| SubmitError::InvalidResponse(format!("invalid quantity '{input}': {e}")))
}

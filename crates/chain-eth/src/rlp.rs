//! Recursive Length Prefix encoding for raw transactions.
//!
//! Items are normalized when they are built rather than when they are
//! written: integers become their minimal big-endian byte string, so a zero
//! nonce, value or chain id serializes as the NULL string `0x80` and never as
//! a literal `0x00` byte. Address fields are the one exception and always keep
//! their 20 raw bytes, even when every byte is zero.
//!
//! Length prefixes are produced by [`alloy_rlp::Header`].

use alloy_primitives::{Address, U256};
use alloy_rlp::Header;

use crate::error::EthError;

/// RLP code of the empty byte string (the NULL marker).
pub const EMPTY_STRING_CODE: u8 = 0x80;

/// RLP code of the empty list.
pub const EMPTY_LIST_CODE: u8 = 0xC0;

/// Largest payload the encoder accepts: lengths must fit in 4 bytes.
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize;

/// Deepest list nesting accepted by the encoder and the decoder.
pub const MAX_DEPTH: usize = 16;

/// A single RLP item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    /// A byte string. An empty string encodes as `0x80`.
    Bytes(Vec<u8>),
    /// A fixed-length address field, written as its raw 20 bytes.
    Address(Address),
    /// A list of nested items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// The NULL item (empty byte string).
    pub fn empty() -> Self {
        Self::Bytes(Vec::new())
    }

    /// An unsigned integer as its minimal big-endian byte string.
    pub fn uint(value: u64) -> Self {
        Self::Bytes(trim_leading_zeros(&value.to_be_bytes()).to_vec())
    }

    /// A 128-bit unsigned integer as its minimal big-endian byte string.
    pub fn uint128(value: u128) -> Self {
        Self::Bytes(trim_leading_zeros(&value.to_be_bytes()).to_vec())
    }

    /// A 256-bit unsigned integer as its minimal big-endian byte string.
    pub fn uint256(value: &U256) -> Self {
        Self::Bytes(trim_leading_zeros(&value.to_be_bytes::<32>()).to_vec())
    }

    /// A big-endian integer given as raw bytes (e.g. a signature scalar).
    pub fn uint_be(bytes: &[u8]) -> Self {
        Self::Bytes(trim_leading_zeros(bytes).to_vec())
    }

    /// An opaque byte string, kept verbatim.
    pub fn bytes(data: &[u8]) -> Self {
        Self::Bytes(data.to_vec())
    }

    pub fn address(address: Address) -> Self {
        Self::Address(address)
    }

    pub fn list(items: Vec<RlpItem>) -> Self {
        Self::List(items)
    }

    /// Returns the byte payload, or `None` for a list.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RlpItem::Bytes(bytes) => Some(bytes),
            RlpItem::Address(address) => Some(address.as_slice()),
            RlpItem::List(_) => None,
        }
    }

    /// Returns the nested items, or `None` for a byte string.
    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            RlpItem::List(items) => Some(items),
            _ => None,
        }
    }

    /// Interprets the item as a canonical unsigned integer of at most 64 bits.
    pub fn to_u64(&self) -> Result<u64, EthError> {
        let bytes = self.integer_bytes(8)?;
        let mut buf = [0u8; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// Interprets the item as a canonical unsigned integer of at most 128 bits.
    pub fn to_u128(&self) -> Result<u128, EthError> {
        let bytes = self.integer_bytes(16)?;
        let mut buf = [0u8; 16];
        buf[16 - bytes.len()..].copy_from_slice(bytes);
        Ok(u128::from_be_bytes(buf))
    }

    /// Interprets the item as a canonical unsigned integer of at most 256 bits.
    pub fn to_u256(&self) -> Result<U256, EthError> {
        let bytes = self.integer_bytes(32)?;
        U256::try_from_be_slice(bytes)
            .ok_or_else(|| EthError::InvalidItem("integer wider than 256 bits".into()))
    }

    fn integer_bytes(&self, max_len: usize) -> Result<&[u8], EthError> {
        let bytes = match self {
            RlpItem::Bytes(bytes) => bytes.as_slice(),
            RlpItem::Address(_) => {
                return Err(EthError::InvalidItem("address is not an integer".into()))
            }
            RlpItem::List(_) => return Err(EthError::InvalidItem("list is not an integer".into())),
        };
        if bytes.len() > max_len {
            return Err(EthError::InvalidItem(format!(
                "integer of {} bytes exceeds {max_len} bytes",
                bytes.len()
            )));
        }
        if bytes.first() == Some(&0) {
            return Err(EthError::InvalidItem("integer has a leading zero byte".into()));
        }
        Ok(bytes)
    }
}

/// Encodes a single item.
pub fn encode_item(item: &RlpItem) -> Result<Vec<u8>, EthError> {
    let mut out = Vec::new();
    write_item(item, 0, &mut out)?;
    Ok(out)
}

/// Encodes `items` as one RLP list.
pub fn encode_list(items: &[RlpItem]) -> Result<Vec<u8>, EthError> {
    let mut out = Vec::new();
    write_list(items, 1, &mut out)?;
    Ok(out)
}

fn write_item(item: &RlpItem, depth: usize, out: &mut Vec<u8>) -> Result<(), EthError> {
    match item {
        RlpItem::Bytes(bytes) => write_string(bytes, out),
        RlpItem::Address(address) => write_string(address.as_slice(), out),
        RlpItem::List(items) => write_list(items, depth + 1, out),
    }
}

fn write_list(items: &[RlpItem], depth: usize, out: &mut Vec<u8>) -> Result<(), EthError> {
    if depth > MAX_DEPTH {
        return Err(EthError::InvalidItem(format!(
            "list nesting exceeds {MAX_DEPTH} levels"
        )));
    }

    let mut payload = Vec::new();
    for item in items {
        write_item(item, depth, &mut payload)?;
    }

    write_header(true, payload.len(), out)?;
    out.extend_from_slice(&payload);
    Ok(())
}

fn write_string(bytes: &[u8], out: &mut Vec<u8>) -> Result<(), EthError> {
    // A single byte below 0x80 is its own encoding.
    if let [byte] = bytes {
        if *byte < EMPTY_STRING_CODE {
            out.push(*byte);
            return Ok(());
        }
    }

    write_header(false, bytes.len(), out)?;
    out.extend_from_slice(bytes);
    Ok(())
}

fn write_header(list: bool, payload_length: usize, out: &mut Vec<u8>) -> Result<(), EthError> {
    if payload_length > MAX_PAYLOAD_LEN {
        return Err(EthError::EncodingOverflow(payload_length));
    }
    Header {
        list,
        payload_length,
    }
    .encode(out);
    Ok(())
}

/// Decodes exactly one item from `bytes`.
///
/// Truncated input, trailing bytes and non-canonical prefixes are rejected
/// with [`EthError::InvalidItem`].
pub fn decode(bytes: &[u8]) -> Result<RlpItem, EthError> {
    let mut buf = bytes;
    let item = read_item(&mut buf, 0)?;
    if !buf.is_empty() {
        return Err(EthError::InvalidItem(format!(
            "{} trailing bytes after item",
            buf.len()
        )));
    }
    Ok(item)
}

fn read_item(buf: &mut &[u8], depth: usize) -> Result<RlpItem, EthError> {
    let header = Header::decode(buf).map_err(|e| EthError::InvalidItem(e.to_string()))?;
    if header.payload_length > buf.len() {
        return Err(EthError::InvalidItem(format!(
            "payload of {} bytes truncated to {}",
            header.payload_length,
            buf.len()
        )));
    }

    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;

    if !header.list {
        return Ok(RlpItem::Bytes(payload.to_vec()));
    }

    if depth + 1 > MAX_DEPTH {
        return Err(EthError::InvalidItem(format!(
            "list nesting exceeds {MAX_DEPTH} levels"
        )));
    }

    let mut inner = payload;
    let mut items = Vec::new();
    while !inner.is_empty() {
        items.push(read_item(&mut inner, depth + 1)?);
    }
    Ok(RlpItem::List(items))
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

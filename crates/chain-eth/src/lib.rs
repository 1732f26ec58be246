//! Raw transaction construction for Ethereum-family networks.
//!
//! This crate provides:
//! - An RLP encoder/decoder with Ethereum's zero-as-NULL integer rule
//! - Legacy and EIP-155 transaction assembly, signing and finalization
//! - Keccak-256 hashing and recoverable secp256k1 signatures
//! - Address derivation and EIP-55 checksums
//! - Network definitions for Ethereum and PlatON

pub mod address;
pub mod chains;
pub mod error;
pub mod rlp;
pub mod signer;
pub mod transaction;

pub use error::EthError;
pub use signer::{PrivateKey, SignatureResult};
pub use transaction::{assemble, EncodedStream, StreamShape, TransactionContext, TxShape};

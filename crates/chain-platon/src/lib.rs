//! PlatON support: Bech32 account addresses and transactions addressed to
//! them. Signing reuses the Ethereum pipeline from `chain-eth`.

pub mod address;
pub mod bech32;
pub mod error;
pub mod transaction;

pub use error::PlatonError;
pub use transaction::PlatonTransaction;

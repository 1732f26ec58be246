use std::time::Duration;

use alloy_primitives::B256;
use thiserror::Error;

/// Submission and receipt-polling errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("no receipt for {tx_hash} within {timeout:?}")]
    ReceiptTimeout { tx_hash: B256, timeout: Duration },

    #[error("transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stream is not a signed transaction")]
    UnsignedStream,

    #[error("invalid config: {0}")]
    Config(String),
}

use thiserror::Error;

/// Errors raised while encoding, assembling or signing a transaction.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("encoding overflow: payload of {0} bytes exceeds the 4-byte length class")]
    EncodingOverflow(usize),

    #[error("invalid rlp item: {0}")]
    InvalidItem(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signing error: {0}")]
    SigningError(String),
}

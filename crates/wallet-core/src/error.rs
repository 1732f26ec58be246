use chain_eth::EthError;
use chain_platon::PlatonError;
use thiserror::Error;
use tx_submit::SubmitError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Eth(#[from] EthError),

    #[error(transparent)]
    Platon(#[from] PlatonError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("chain id mismatch: network is {expected}, transaction has {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("network {0} has no bech32 address prefix")]
    NoBech32Prefix(u64),
}

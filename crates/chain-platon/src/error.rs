use chain_eth::EthError;
use thiserror::Error;

/// PlatON address and transaction errors.
#[derive(Debug, Error)]
pub enum PlatonError {
    #[error("invalid human-readable part: {0}")]
    InvalidHrp(String),

    #[error("bech32 checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid character {ch:?} at position {pos}")]
    InvalidCharacter { ch: char, pos: usize },

    #[error("bech32 string too long: {0} characters, limit is 90")]
    TooLong(usize),

    #[error("missing bech32 separator")]
    MissingSeparator,

    #[error("invalid data length: {0}")]
    InvalidLength(String),

    #[error("invalid padding in bech32 data")]
    InvalidPadding,

    #[error("address prefix mismatch: expected {expected}, got {actual}")]
    HrpMismatch { expected: String, actual: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Eth(#[from] EthError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_hrp() {
        let err = PlatonError::InvalidHrp("empty".into());
        assert_eq!(err.to_string(), "invalid human-readable part: empty");
    }

    #[test]
    fn display_invalid_character() {
        let err = PlatonError::InvalidCharacter { ch: 'b', pos: 7 };
        assert_eq!(err.to_string(), "invalid character 'b' at position 7");
    }

    #[test]
    fn display_too_long() {
        let err = PlatonError::TooLong(91);
        assert_eq!(err.to_string(), "bech32 string too long: 91 characters, limit is 90");
    }

    #[test]
    fn display_hrp_mismatch() {
        let err = PlatonError::HrpMismatch {
            expected: "lat".into(),
            actual: "lax".into(),
        };
        assert_eq!(err.to_string(), "address prefix mismatch: expected lat, got lax");
    }

    #[test]
    fn eth_errors_pass_through() {
        let err: PlatonError = EthError::MissingField("nonce").into();
        assert_eq!(err.to_string(), "missing field: nonce");
    }
}

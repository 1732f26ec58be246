//! Keccak-256 hashing and recoverable secp256k1 signatures.

use std::fmt;

use alloy_primitives::{Address, B256};
use k256::ecdsa::signature::hazmat::{PrehashSigner, RandomizedPrehashSigner};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::address::pubkey_to_address;
use crate::error::EthError;
use crate::transaction::EncodedStream;

/// A secp256k1 private key handle.
///
/// The scalar is validated on construction and wiped from memory on drop. It
/// is never printed: `Debug` renders as `PrivateKey(..)`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Wraps a raw 32-byte scalar, rejecting zero and values at or above the
    /// curve order.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, EthError> {
        SigningKey::from_bytes(bytes.into())
            .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self(*bytes))
    }

    /// Parses a hex-encoded scalar, with or without a `0x` prefix.
    pub fn from_hex(input: &str) -> Result<Self, EthError> {
        let trimmed = input.trim();
        let hex_str = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let mut decoded = hex::decode(hex_str)
            .map_err(|e| EthError::InvalidPrivateKey(format!("invalid hex: {e}")))?;
        if decoded.len() != 32 {
            let len = decoded.len();
            decoded.zeroize();
            return Err(EthError::InvalidPrivateKey(format!(
                "expected 32 bytes, got {len}"
            )));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// The account address controlled by this key.
    pub fn address(&self) -> Result<Address, EthError> {
        let verifying_key = *self.signing_key()?.verifying_key();
        pubkey_to_address(verifying_key.to_encoded_point(false).as_bytes())
    }

    fn signing_key(&self) -> Result<SigningKey, EthError> {
        SigningKey::from_bytes((&self.0).into())
            .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// Output of one signing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureResult {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Parity of the ephemeral public key's y coordinate (0 or 1).
    pub recovery_id: u8,
}

/// Keccak-256 digest, the transaction hash function of both Ethereum and
/// PlatON.
pub fn keccak256(data: &[u8]) -> B256 {
    B256::from_slice(&Keccak256::digest(data))
}

/// Hashes `stream` with Keccak-256 and signs the digest.
pub fn sign(stream: &EncodedStream, key: &PrivateKey) -> Result<SignatureResult, EthError> {
    let hash = keccak256(stream.as_bytes());
    sign_hash(&hash, key)
}

/// Signs a 32-byte digest.
///
/// The first attempt uses the deterministic RFC 6979 nonce. If the curve
/// operation fails, one more attempt is made with a randomized nonce before
/// the error is surfaced.
pub fn sign_hash(hash: &B256, key: &PrivateKey) -> Result<SignatureResult, EthError> {
    let signing_key = key.signing_key()?;

    let (signature, recovery_id) = sign_with_retry(
        || signing_key.sign_prehash(hash.as_slice()),
        || randomized_attempt(&signing_key, hash),
    )?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature.r().to_bytes());
    s.copy_from_slice(&signature.s().to_bytes());

    Ok(SignatureResult {
        r,
        s,
        recovery_id: recovery_id.is_y_odd() as u8,
    })
}

/// Runs `deterministic`, falling back to `randomized` exactly once.
fn sign_with_retry<D, R>(deterministic: D, randomized: R) -> Result<(Signature, RecoveryId), EthError>
where
    D: FnOnce() -> Result<(Signature, RecoveryId), k256::ecdsa::Error>,
    R: FnOnce() -> Result<(Signature, RecoveryId), k256::ecdsa::Error>,
{
    match deterministic() {
        Ok(pair) => Ok(pair),
        Err(e) => {
            tracing::warn!(error = %e, "deterministic signing failed, retrying with a fresh nonce");
            randomized().map_err(|e| EthError::SigningError(e.to_string()))
        }
    }
}

/// Signs with an `OsRng` nonce, normalizes to low-S and recovers the parity
/// by trial.
fn randomized_attempt(
    signing_key: &SigningKey,
    hash: &B256,
) -> Result<(Signature, RecoveryId), k256::ecdsa::Error> {
    let signature: Signature = signing_key.sign_prehash_with_rng(&mut OsRng, hash.as_slice())?;
    let signature = signature.normalize_s().unwrap_or(signature);
    let recovery_id = RecoveryId::trial_recovery_from_prehash(
        signing_key.verifying_key(),
        hash.as_slice(),
        &signature,
    )?;
    Ok((signature, recovery_id))
}

/// Recovers the address that produced `signature` over `hash`.
pub fn recover_signer(hash: &B256, signature: &SignatureResult) -> Result<Address, EthError> {
    let sig = Signature::from_scalars(signature.r, signature.s)
        .map_err(|e| EthError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id).ok_or_else(|| {
        EthError::InvalidSignature(format!("recovery id {} out of range", signature.recovery_id))
    })?;

    let verifying_key = VerifyingKey::recover_from_prehash(hash.as_slice(), &sig, recovery_id)
        .map_err(|e| EthError::InvalidSignature(e.to_string()))?;
    pubkey_to_address(verifying_key.to_encoded_point(false).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::checksum_address;

    /// Well-known test private key (DO NOT use on mainnet).
    const TEST_PRIVKEY: [u8; 32] = {
        let mut key = [0u8; 32];
        key[31] = 1;
        key
    };

    #[test]
    fn keccak256_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn zero_key_is_rejected() {
        let result = PrivateKey::from_bytes(&[0u8; 32]);
        assert!(matches!(result, Err(EthError::InvalidPrivateKey(_))));
    }

    #[test]
    fn key_above_curve_order_is_rejected() {
        assert!(PrivateKey::from_bytes(&[0xff; 32]).is_err());
    }

    #[test]
    fn from_hex_accepts_prefixed_and_bare() {
        let bare = "46".repeat(32);
        let a = PrivateKey::from_hex(&bare).unwrap();
        let b = PrivateKey::from_hex(&format!("0x{bare}")).unwrap();
        assert_eq!(a.address().unwrap(), b.address().unwrap());
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(PrivateKey::from_hex("0x4646").is_err());
        assert!(PrivateKey::from_hex("zz").is_err());
    }

    #[test]
    fn debug_does_not_leak_key_material() {
        let key = PrivateKey::from_hex(&"46".repeat(32)).unwrap();
        assert_eq!(format!("{key:?}"), "PrivateKey(..)");
    }

    #[test]
    fn address_matches_known_vector() {
        let key = PrivateKey::from_bytes(&TEST_PRIVKEY).unwrap();
        assert_eq!(
            checksum_address(&key.address().unwrap()),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn signing_is_deterministic() {
        let key = PrivateKey::from_bytes(&TEST_PRIVKEY).unwrap();
        let hash = keccak256(b"payload");
        assert_eq!(sign_hash(&hash, &key).unwrap(), sign_hash(&hash, &key).unwrap());
    }

    #[test]
    fn signature_recovers_signer() {
        let key = PrivateKey::from_hex(&"46".repeat(32)).unwrap();
        let hash = keccak256(b"recover me");
        let sig = sign_hash(&hash, &key).unwrap();

        assert!(sig.recovery_id <= 1);
        assert_eq!(recover_signer(&hash, &sig).unwrap(), key.address().unwrap());
    }

    #[test]
    fn signature_is_low_s() {
        // secp256k1 order / 2
        let half_order =
            hex::decode("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0").unwrap();
        let key = PrivateKey::from_bytes(&TEST_PRIVKEY).unwrap();
        for i in 0..8u8 {
            let sig = sign_hash(&keccak256(&[i]), &key).unwrap();
            assert!(sig.s.as_slice() <= half_order.as_slice());
        }
    }

    #[test]
    fn recover_rejects_bad_recovery_id() {
        let key = PrivateKey::from_bytes(&TEST_PRIVKEY).unwrap();
        let hash = keccak256(b"x");
        let mut sig = sign_hash(&hash, &key).unwrap();
        sig.recovery_id = 7;
        assert!(matches!(
            recover_signer(&hash, &sig),
            Err(EthError::InvalidSignature(_))
        ));
    }

    #[test]
    fn retry_runs_once_after_deterministic_failure() {
        let mut retries = 0;
        let result = sign_with_retry(
            || Err(k256::ecdsa::Error::new()),
            || {
                retries += 1;
                Err(k256::ecdsa::Error::new())
            },
        );
        assert_eq!(retries, 1);
        assert!(matches!(result, Err(EthError::SigningError(_))));
    }

    #[test]
    fn retry_is_skipped_when_first_attempt_succeeds() {
        let key = PrivateKey::from_bytes(&TEST_PRIVKEY).unwrap();
        let signing_key = key.signing_key().unwrap();
        let hash = keccak256(b"no retry");

        let mut retries = 0;
        sign_with_retry(
            || signing_key.sign_prehash(hash.as_slice()),
            || {
                retries += 1;
                randomized_attempt(&signing_key, &hash)
            },
        )
        .unwrap();
        assert_eq!(retries, 0);
    }

    #[test]
    fn retried_signature_is_low_s_and_recoverable() {
        let half_order =
            hex::decode("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0").unwrap();
        let key = PrivateKey::from_hex(&"46".repeat(32)).unwrap();
        let signing_key = key.signing_key().unwrap();
        let hash = keccak256(b"fallback");

        let (signature, recovery_id) = sign_with_retry(
            || Err(k256::ecdsa::Error::new()),
            || randomized_attempt(&signing_key, &hash),
        )
        .unwrap();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&signature.r().to_bytes());
        s.copy_from_slice(&signature.s().to_bytes());
        assert!(s.as_slice() <= half_order.as_slice());

        let sig = SignatureResult {
            r,
            s,
            recovery_id: recovery_id.is_y_odd() as u8,
        };
        assert_eq!(recover_signer(&hash, &sig).unwrap(), key.address().unwrap());
    }
}

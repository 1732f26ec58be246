use alloy_primitives::Address;
use chain_eth::PrivateKey;

use crate::bech32;
use crate::error::PlatonError;

/// Human-readable part of PlatON mainnet addresses.
pub const MAINNET_HRP: &str = "lat";

/// Human-readable part of PlatON testnet addresses.
pub const TESTNET_HRP: &str = "lax";

/// Formats a 20-byte account address as a PlatON Bech32 address.
pub fn to_bech32_address(address: &Address, hrp: &str) -> Result<String, PlatonError> {
    bech32::encode(hrp, address.as_slice())
}

/// Resolves a PlatON Bech32 address into raw account bytes.
///
/// The decoded prefix must equal `expected_hrp` and the payload must be
/// exactly 20 bytes.
pub fn from_bech32_address(address: &str, expected_hrp: &str) -> Result<Address, PlatonError> {
    let (hrp, payload) = bech32::decode(address)?;

    if !hrp.eq_ignore_ascii_case(expected_hrp) {
        return Err(PlatonError::HrpMismatch {
            expected: expected_hrp.to_string(),
            actual: hrp,
        });
    }

    if payload.len() != 20 {
        return Err(PlatonError::InvalidAddress(format!(
            "expected 20 payload bytes, got {}",
            payload.len()
        )));
    }

    Ok(Address::from_slice(&payload))
}

/// The PlatON address controlled by `key`.
pub fn key_to_bech32_address(key: &PrivateKey, hrp: &str) -> Result<String, PlatonError> {
    to_bech32_address(&key.address()?, hrp)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_HEX: &str = "9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f";
    const ALICE: &str = "lat1nk9x9ajk4rgkzhqjjn7hr6w0k0jg2kj0mvznm5";

    #[test]
    fn mainnet_address_from_raw_bytes() {
        let raw = Address::from_slice(&hex::decode(ALICE_HEX).unwrap());
        assert_eq!(to_bech32_address(&raw, MAINNET_HRP).unwrap(), ALICE);
    }

    #[test]
    fn testnet_address_uses_lax_prefix() {
        let raw = Address::from_slice(&hex::decode(ALICE_HEX).unwrap());
        let addr = to_bech32_address(&raw, TESTNET_HRP).unwrap();
        assert!(addr.starts_with("lax1"), "expected lax1 prefix, got {addr}");
    }

    #[test]
    fn resolves_address_bytes() {
        let resolved = from_bech32_address(ALICE, MAINNET_HRP).unwrap();
        assert_eq!(hex::encode(resolved), ALICE_HEX);
    }

    #[test]
    fn all_zero_address_resolves() {
        let resolved =
            from_bech32_address("lat1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq542u6a", MAINNET_HRP).unwrap();
        assert_eq!(resolved, Address::ZERO);
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let err = from_bech32_address(ALICE, TESTNET_HRP).unwrap_err();
        assert!(matches!(err, PlatonError::HrpMismatch { .. }));
    }

    #[test]
    fn wrong_payload_length_is_rejected() {
        let short = bech32::encode(MAINNET_HRP, &[0x11; 19]).unwrap();
        let err = from_bech32_address(&short, MAINNET_HRP).unwrap_err();
        assert!(matches!(err, PlatonError::InvalidAddress(_)));
    }

    #[test]
    fn key_address_matches_known_vector() {
        let key = PrivateKey::from_hex(&"46".repeat(32)).unwrap();
        assert_eq!(key_to_bech32_address(&key, MAINNET_HRP).unwrap(), ALICE);
    }
}

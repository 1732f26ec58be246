//! BIP-173 Bech32 codec.
//!
//! A Bech32 string is `hrp || '1' || data || checksum`, where the data part
//! carries the payload regrouped into 5-bit values and the checksum is six
//! 5-bit values of a BCH code over the expanded hrp and the data. The code
//! detects errors; it does not correct them.

use crate::error::PlatonError;

/// Data-part alphabet, indexed by 5-bit value.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Generator coefficients of the BCH checksum.
const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

/// Residue of a valid Bech32 (not Bech32m) checksum.
const CHECKSUM_CONST: u32 = 1;

pub const SEPARATOR: char = '1';
pub const CHECKSUM_LEN: usize = 6;
pub const MAX_HRP_LEN: usize = 83;
/// Longest string the codec produces or accepts.
pub const MAX_LEN: usize = 90;

/// Encodes `payload` under the human-readable part `hrp`.
///
/// The output is always lowercase.
pub fn encode(hrp: &str, payload: &[u8]) -> Result<String, PlatonError> {
    validate_hrp(hrp)?;
    if hrp.bytes().any(|b| b.is_ascii_lowercase()) && hrp.bytes().any(|b| b.is_ascii_uppercase())
    {
        return Err(PlatonError::InvalidHrp(format!("{hrp:?} mixes case")));
    }
    let hrp = hrp.to_ascii_lowercase();

    let data = convert_bits(payload, 8, 5, true)?;
    let total = hrp.len() + 1 + data.len() + CHECKSUM_LEN;
    if total > MAX_LEN {
        return Err(PlatonError::TooLong(total));
    }

    let checksum = create_checksum(hrp.as_bytes(), &data);

    let mut out = String::with_capacity(total);
    out.push_str(&hrp);
    out.push(SEPARATOR);
    for value in data.iter().chain(checksum.iter()) {
        out.push(CHARSET[*value as usize] as char);
    }
    Ok(out)
}

/// Decodes a Bech32 string into its lowercase hrp and payload bytes.
pub fn decode(input: &str) -> Result<(String, Vec<u8>), PlatonError> {
    let mut has_lower = false;
    let mut has_upper = false;
    for (pos, ch) in input.chars().enumerate() {
        if !(ch.is_ascii() && (33..=126).contains(&(ch as u8))) {
            return Err(PlatonError::InvalidCharacter { ch, pos });
        }
        has_lower |= ch.is_ascii_lowercase();
        has_upper |= ch.is_ascii_uppercase();
        if has_lower && has_upper {
            return Err(PlatonError::InvalidCharacter { ch, pos });
        }
    }

    if input.len() > MAX_LEN {
        return Err(PlatonError::TooLong(input.len()));
    }

    let lower = input.to_ascii_lowercase();
    let sep = lower.rfind(SEPARATOR).ok_or(PlatonError::MissingSeparator)?;
    let (hrp, data_part) = (&lower[..sep], &lower[sep + 1..]);
    validate_hrp(hrp)?;

    if data_part.len() < CHECKSUM_LEN {
        return Err(PlatonError::InvalidLength(format!(
            "data part has {} characters, checksum alone needs {CHECKSUM_LEN}",
            data_part.len()
        )));
    }

    let mut data = Vec::with_capacity(data_part.len());
    for (i, ch) in data_part.bytes().enumerate() {
        let value = CHARSET
            .iter()
            .position(|&c| c == ch)
            .ok_or(PlatonError::InvalidCharacter {
                ch: ch as char,
                pos: sep + 1 + i,
            })?;
        data.push(value as u8);
    }

    if !verify_checksum(hrp.as_bytes(), &data) {
        return Err(PlatonError::ChecksumMismatch);
    }

    let payload = convert_bits(&data[..data.len() - CHECKSUM_LEN], 5, 8, false)?;
    Ok((hrp.to_string(), payload))
}

fn validate_hrp(hrp: &str) -> Result<(), PlatonError> {
    if hrp.is_empty() || hrp.len() > MAX_HRP_LEN {
        return Err(PlatonError::InvalidHrp(format!(
            "length {} outside 1..={MAX_HRP_LEN}",
            hrp.len()
        )));
    }
    if let Some(bad) = hrp.chars().find(|c| !(c.is_ascii() && (33..=126).contains(&(*c as u8)))) {
        return Err(PlatonError::InvalidHrp(format!("contains {bad:?}")));
    }
    Ok(())
}

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &value in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ value as u32;
        for (i, gen) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= gen;
            }
        }
    }
    chk
}

/// High bits of every hrp character, a zero separator, then the low bits.
fn hrp_expand(hrp: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(hrp.len() * 2 + 1);
    out.extend(hrp.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(hrp.iter().map(|b| b & 0x1f));
    out
}

fn create_checksum(hrp: &[u8], data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0u8; CHECKSUM_LEN]);
    let residue = polymod(&values) ^ CHECKSUM_CONST;

    let mut checksum = [0u8; CHECKSUM_LEN];
    for (i, value) in checksum.iter_mut().enumerate() {
        *value = ((residue >> (5 * (CHECKSUM_LEN - 1 - i))) & 0x1f) as u8;
    }
    checksum
}

fn verify_checksum(hrp: &[u8], data: &[u8]) -> bool {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    polymod(&values) == CHECKSUM_CONST
}

/// Regroups a bit stream from `from`-bit to `to`-bit values.
///
/// With `pad`, a trailing partial group is zero-filled. Without it, leftover
/// bits must be fewer than `from` and all zero.
pub fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, PlatonError> {
    let max_value: u32 = (1 << to) - 1;
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        let value = value as u32;
        if value >> from != 0 {
            return Err(PlatonError::InvalidLength(format!(
                "value {value} does not fit in {from} bits"
            )));
        }
        acc = ((acc << from) | value) & 0xffff;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max_value) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max_value) != 0 {
        return Err(PlatonError::InvalidPadding);
    }

    Ok(out)
}

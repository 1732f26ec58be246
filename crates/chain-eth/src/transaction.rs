use alloy_primitives::{Address, B256, U256};

use crate::error::EthError;
use crate::rlp::{self, RlpItem};
use crate::signer::{self, PrivateKey, SignatureResult};

/// Offset added to the recovery id for transactions without replay protection.
const LEGACY_V_OFFSET: u128 = 27;

/// Offset added to `chain_id * 2 + recovery_id` under EIP-155.
const EIP155_V_OFFSET: u128 = 35;

/// Caller-owned record describing one transaction send.
///
/// `v`, `r` and `s` are outputs: they are cleared at the start of every
/// [`assemble`] and written only by [`finalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionContext {
    pub nonce: Option<u64>,
    pub gas_price: Option<U256>,
    pub gas_limit: Option<U256>,
    pub recipient: Option<Address>,
    /// Transfer value in wei. Absent encodes the same as zero.
    pub value: Option<U256>,
    /// Call data. Absent encodes the same as empty.
    pub data: Option<Vec<u8>>,
    /// Presence selects the EIP-155 layout.
    pub chain_id: Option<u64>,
    pub v: Option<u128>,
    pub r: Option<[u8; 32]>,
    pub s: Option<[u8; 32]>,
}

impl TransactionContext {
    /// Transaction layout selected by the presence of `chain_id`.
    pub fn shape(&self) -> TxShape {
        match self.chain_id {
            Some(chain_id) => TxShape::Eip155 { chain_id },
            None => TxShape::Legacy,
        }
    }

    /// Clears the signature outputs so the context can be sent again.
    pub fn reset_signature(&mut self) {
        self.v = None;
        self.r = None;
        self.s = None;
    }

    /// The six leading fields shared by every layout:
    /// `[nonce, gas_price, gas_limit, recipient, value, data]`.
    fn base_fields(&self) -> Result<Vec<RlpItem>, EthError> {
        let nonce = self.nonce.ok_or(EthError::MissingField("nonce"))?;
        let gas_price = self.gas_price.ok_or(EthError::MissingField("gas_price"))?;
        let gas_limit = self.gas_limit.ok_or(EthError::MissingField("gas_limit"))?;
        let recipient = self.recipient.ok_or(EthError::MissingField("recipient"))?;

        let mut fields = Vec::with_capacity(9);
        fields.push(RlpItem::uint(nonce));
        fields.push(RlpItem::uint256(&gas_price));
        fields.push(RlpItem::uint256(&gas_limit));
        fields.push(RlpItem::address(recipient));
        fields.push(RlpItem::uint256(&self.value.unwrap_or(U256::ZERO)));
        fields.push(RlpItem::bytes(self.data.as_deref().unwrap_or_default()));
        Ok(fields)
    }
}

/// The two transaction layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxShape {
    /// No replay protection: six-field signing payload, `v = 27 + parity`.
    Legacy,
    /// EIP-155: nine-field signing payload with `v = chain_id, r = s = NULL`,
    /// and `v = chain_id * 2 + 35 + parity` once signed.
    Eip155 { chain_id: u64 },
}

impl TxShape {
    /// The `v` value written into the signed transaction.
    pub fn signed_v(&self, recovery_id: u8) -> u128 {
        match self {
            TxShape::Legacy => LEGACY_V_OFFSET + recovery_id as u128,
            TxShape::Eip155 { chain_id } => {
                *chain_id as u128 * 2 + EIP155_V_OFFSET + recovery_id as u128
            }
        }
    }

    /// Splits a signed `v` back into the layout and the recovery id.
    pub fn from_signed_v(v: u128) -> Result<(TxShape, u8), EthError> {
        match v {
            27 | 28 => Ok((TxShape::Legacy, (v - LEGACY_V_OFFSET) as u8)),
            v if v >= EIP155_V_OFFSET => {
                let chain_id = u64::try_from((v - EIP155_V_OFFSET) / 2).map_err(|_| {
                    EthError::InvalidSignature(format!("chain id in v={v} exceeds 64 bits"))
                })?;
                let recovery_id = ((v - EIP155_V_OFFSET) % 2) as u8;
                Ok((TxShape::Eip155 { chain_id }, recovery_id))
            }
            v => Err(EthError::InvalidSignature(format!("unsupported v value {v}"))),
        }
    }
}

/// Which stage of the pipeline an [`EncodedStream`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamShape {
    /// The pre-signature encoding whose hash gets signed.
    SigningPayload,
    /// The final nine-field signed transaction.
    Signed,
}

/// An immutable RLP byte stream tagged with its pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStream {
    shape: StreamShape,
    bytes: Vec<u8>,
}

impl EncodedStream {
    pub fn new(shape: StreamShape, bytes: Vec<u8>) -> Self {
        Self { shape, bytes }
    }

    pub fn shape(&self) -> StreamShape {
        self.shape
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// `0x`-prefixed hex, the form expected by `*_sendRawTransaction`.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes))
    }
}

/// Encodes the stream that gets hashed and signed (step 1 of [`assemble`]).
pub fn signing_payload(ctx: &TransactionContext) -> Result<EncodedStream, EthError> {
    let mut fields = ctx.base_fields()?;
    if let TxShape::Eip155 { chain_id } = ctx.shape() {
        fields.push(RlpItem::uint(chain_id));
        fields.push(RlpItem::empty());
        fields.push(RlpItem::empty());
    }
    let bytes = rlp::encode_list(&fields)?;
    Ok(EncodedStream::new(StreamShape::SigningPayload, bytes))
}

/// Builds, signs and finalizes the transaction described by `ctx`.
///
/// Any stale `v`/`r`/`s` in `ctx` are discarded first; on success they hold
/// the values carried by the returned signed stream.
pub fn assemble(
    ctx: &mut TransactionContext,
    key: &PrivateKey,
) -> Result<EncodedStream, EthError> {
    ctx.reset_signature();

    let shape = ctx.shape();
    let payload = signing_payload(ctx)?;
    tracing::debug!(?shape, nonce = ?ctx.nonce, payload_len = payload.as_bytes().len(), "signing transaction");

    let signature = signer::sign(&payload, key)?;
    finalize(ctx, &signature)
}

/// Folds a signature into the nine-field list and encodes the signed stream.
///
/// Writes `ctx.v`, `ctx.r` and `ctx.s`. Calling it again with the same inputs
/// yields the same stream.
pub fn finalize(
    ctx: &mut TransactionContext,
    signature: &SignatureResult,
) -> Result<EncodedStream, EthError> {
    if signature.recovery_id > 1 {
        return Err(EthError::InvalidSignature(format!(
            "recovery id {} out of range",
            signature.recovery_id
        )));
    }

    let v = ctx.shape().signed_v(signature.recovery_id);

    let mut fields = ctx.base_fields()?;
    fields.push(RlpItem::uint128(v));
    fields.push(RlpItem::uint_be(&signature.r));
    fields.push(RlpItem::uint_be(&signature.s));
    let bytes = rlp::encode_list(&fields)?;

    ctx.v = Some(v);
    ctx.r = Some(signature.r);
    ctx.s = Some(signature.s);

    Ok(EncodedStream::new(StreamShape::Signed, bytes))
}

/// Hash identifying a signed transaction on chain.
pub fn transaction_hash(stream: &EncodedStream) -> B256 {
    signer::keccak256(stream.as_bytes())
}

/// A decoded signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub context: TransactionContext,
    pub signature: SignatureResult,
}

impl SignedTransaction {
    /// Recovers the sender by rebuilding the signing payload of the decoded
    /// layout.
    pub fn recover_sender(&self) -> Result<Address, EthError> {
        let payload = signing_payload(&self.context)?;
        signer::recover_signer(&signer::keccak256(payload.as_bytes()), &self.signature)
    }
}

/// Decodes a signed nine-field transaction, inferring its layout from `v`.
pub fn decode_signed(bytes: &[u8]) -> Result<SignedTransaction, EthError> {
    let item = rlp::decode(bytes)?;
    let fields = item
        .as_list()
        .ok_or_else(|| EthError::InvalidItem("transaction is not a list".into()))?;
    if fields.len() != 9 {
        return Err(EthError::InvalidItem(format!(
            "expected 9 fields, got {}",
            fields.len()
        )));
    }

    let recipient_bytes = field_bytes(&fields[3], "recipient")?;
    if recipient_bytes.len() != 20 {
        return Err(EthError::InvalidAddress(format!(
            "expected 20 recipient bytes, got {}",
            recipient_bytes.len()
        )));
    }

    let v = fields[6].to_u128()?;
    let (shape, recovery_id) = TxShape::from_signed_v(v)?;

    let context = TransactionContext {
        nonce: Some(fields[0].to_u64()?),
        gas_price: Some(fields[1].to_u256()?),
        gas_limit: Some(fields[2].to_u256()?),
        recipient: Some(Address::from_slice(recipient_bytes)),
        value: Some(fields[4].to_u256()?),
        data: Some(field_bytes(&fields[5], "data")?.to_vec()),
        chain_id: match shape {
            TxShape::Legacy => None,
            TxShape::Eip155 { chain_id } => Some(chain_id),
        },
        v: Some(v),
        r: Some(scalar(&fields[7], "r")?),
        s: Some(scalar(&fields[8], "s")?),
    };

    let signature = SignatureResult {
        r: context.r.unwrap_or_default(),
        s: context.s.unwrap_or_default(),
        recovery_id,
    };

    Ok(SignedTransaction { context, signature })
}

fn field_bytes<'a>(item: &'a RlpItem, name: &str) -> Result<&'a [u8], EthError> {
    item.as_bytes()
        .ok_or_else(|| EthError::InvalidItem(format!("{name} must be a byte string")))
}

/// Left-pads a minimal big-endian scalar back to 32 bytes.
fn scalar(item: &RlpItem, name: &str) -> Result<[u8; 32], EthError> {
    let bytes = field_bytes(item, name)?;
    if bytes.len() > 32 {
        return Err(EthError::InvalidSignature(format!(
            "{name} is {} bytes long",
            bytes.len()
        )));
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

use alloy_primitives::U256;
use chain_eth::{EncodedStream, EthError, PrivateKey, TransactionContext};

use crate::address::from_bech32_address;
use crate::error::PlatonError;

/// A PlatON transaction request whose recipient is a Bech32 address.
///
/// PlatON shares Ethereum's nine-field layout; the only difference at this
/// level is the textual recipient, which is resolved to raw bytes before
/// encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatonTransaction {
    pub nonce: Option<u64>,
    pub gas_price: Option<U256>,
    pub gas_limit: Option<U256>,
    /// Bech32 recipient, e.g. `lat1...`.
    pub recipient: Option<String>,
    pub value: Option<U256>,
    pub data: Option<Vec<u8>>,
    pub chain_id: Option<u64>,
}

impl PlatonTransaction {
    /// Resolves the Bech32 recipient and builds the signing context.
    pub fn into_context(&self, hrp: &str) -> Result<TransactionContext, PlatonError> {
        let recipient = self
            .recipient
            .as_deref()
            .ok_or(EthError::MissingField("recipient"))?;

        Ok(TransactionContext {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            recipient: Some(from_bech32_address(recipient, hrp)?),
            value: self.value,
            data: self.data.clone(),
            chain_id: self.chain_id,
            ..Default::default()
        })
    }

    /// Resolves, signs and finalizes the transaction.
    ///
    /// Returns the signed context alongside the stream so callers can inspect
    /// `v`, `r` and `s`.
    pub fn sign(
        &self,
        key: &PrivateKey,
        hrp: &str,
    ) -> Result<(TransactionContext, EncodedStream), PlatonError> {
        let mut ctx = self.into_context(hrp)?;
        tracing::debug!(recipient = ?self.recipient, chain_id = ?self.chain_id, "assembling PlatON transaction");
        let stream = chain_eth::assemble(&mut ctx, key)?;
        Ok((ctx, stream))
    }
}

//! Wallet facade: one private key bound to one network and one node.
//!
//! [`Wallet`] fixes the replay-protection branch from its [`ChainConfig`],
//! signs Ethereum contexts or PlatON requests, and hands the finished stream
//! to a [`SubmissionService`].

pub mod config;
pub mod error;
pub mod logging;

use alloy_primitives::{Address, B256};
use chain_eth::{EncodedStream, PrivateKey, TransactionContext};
use chain_platon::PlatonTransaction;
use tx_submit::{HttpTransport, Receipt, SubmissionService, Transport};

pub use config::{ChainConfig, WalletConfig};
pub use error::WalletError;

pub struct Wallet<T> {
    key: PrivateKey,
    chain: ChainConfig,
    service: SubmissionService<T>,
}

impl Wallet<HttpTransport> {
    /// Builds a wallet talking JSON-RPC to the configured endpoint.
    pub fn connect(key: PrivateKey, config: &WalletConfig) -> Result<Self, WalletError> {
        config.validate()?;
        let transport = HttpTransport::new(&config.submit)?;
        tracing::info!(
            chain_id = config.chain.chain_id,
            rpc_url = %config.submit.rpc_url,
            "wallet connected"
        );
        Ok(Self::new(
            key,
            config.chain.clone(),
            SubmissionService::from_config(transport, &config.submit),
        ))
    }
}

impl<T: Transport> Wallet<T> {
    pub fn new(key: PrivateKey, chain: ChainConfig, service: SubmissionService<T>) -> Self {
        Self {
            key,
            chain,
            service,
        }
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn service(&self) -> &SubmissionService<T> {
        &self.service
    }

    pub fn address(&self) -> Result<Address, WalletError> {
        Ok(self.key.address()?)
    }

    /// The sender address in the network's Bech32 form.
    pub fn bech32_address(&self) -> Result<String, WalletError> {
        let hrp = self.hrp()?;
        Ok(chain_platon::address::key_to_bech32_address(&self.key, hrp)?)
    }

    /// Signs `ctx` for this wallet's network.
    ///
    /// A chain id already present on the context must match the network.
    /// On legacy networks it is cleared so the unprotected layout is used.
    pub fn sign(&self, ctx: &mut TransactionContext) -> Result<EncodedStream, WalletError> {
        self.check_chain_id(ctx.chain_id)?;
        ctx.chain_id = self.chain.replay_chain_id();
        Ok(chain_eth::assemble(ctx, &self.key)?)
    }

    /// Signs a PlatON request, resolving its Bech32 recipient against the
    /// network's prefix.
    pub fn sign_platon(
        &self,
        tx: &PlatonTransaction,
    ) -> Result<(TransactionContext, EncodedStream), WalletError> {
        let hrp = self.hrp()?;
        self.check_chain_id(tx.chain_id)?;
        let tx = PlatonTransaction {
            chain_id: self.chain.replay_chain_id(),
            ..tx.clone()
        };
        Ok(tx.sign(&self.key, hrp)?)
    }

    /// Signs and submits without waiting for inclusion.
    pub async fn send_raw_tx(&self, ctx: &mut TransactionContext) -> Result<B256, WalletError> {
        let stream = self.sign(ctx)?;
        Ok(self.service.send_async(&stream).await?)
    }

    /// Signs, submits and waits for the receipt.
    pub async fn send_raw_tx_with_receipt(
        &self,
        ctx: &mut TransactionContext,
    ) -> Result<Receipt, WalletError> {
        let stream = self.sign(ctx)?;
        Ok(self.service.send_sync(&stream).await?)
    }

    /// Signs and submits a PlatON request. The signed context is returned
    /// with the hash so callers can read `v`, `r` and `s`.
    pub async fn send_platon_tx(
        &self,
        tx: &PlatonTransaction,
    ) -> Result<(TransactionContext, B256), WalletError> {
        let (ctx, stream) = self.sign_platon(tx)?;
        let tx_hash = self.service.send_async(&stream).await?;
        Ok((ctx, tx_hash))
    }

    pub async fn send_platon_tx_with_receipt(
        &self,
        tx: &PlatonTransaction,
    ) -> Result<(TransactionContext, Receipt), WalletError> {
        let (ctx, stream) = self.sign_platon(tx)?;
        let receipt = self.service.send_sync(&stream).await?;
        Ok((ctx, receipt))
    }

    fn hrp(&self) -> Result<&str, WalletError> {
        self.chain
            .bech32_hrp()
            .ok_or(WalletError::NoBech32Prefix(self.chain.chain_id))
    }

    fn check_chain_id(&self, requested: Option<u64>) -> Result<(), WalletError> {
        match requested {
            Some(actual) if actual != self.chain.chain_id => Err(WalletError::ChainMismatch {
                expected: self.chain.chain_id,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

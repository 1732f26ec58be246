use chain_eth::chains::{get_chain, EvmChain};
use chain_eth::TxShape;
use serde::{Deserialize, Serialize};
use tx_submit::SubmitConfig;

use crate::error::WalletError;

/// The network transactions are signed for.
///
/// `eip155` and `bech32_hrp` fall back to the matching preset in
/// [`chain_eth::chains`] when omitted. Unknown chains default to EIP-155
/// signing without a Bech32 prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eip155: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bech32_hrp: Option<String>,
}

impl ChainConfig {
    pub fn from_preset(chain: &EvmChain) -> Self {
        Self {
            chain_id: chain.chain_id,
            eip155: Some(chain.eip155),
            bech32_hrp: chain.bech32_hrp.map(str::to_string),
        }
    }

    pub fn preset(&self) -> Option<&'static EvmChain> {
        get_chain(self.chain_id)
    }

    pub fn eip155(&self) -> bool {
        self.eip155
            .or_else(|| self.preset().map(|c| c.eip155))
            .unwrap_or(true)
    }

    pub fn bech32_hrp(&self) -> Option<&str> {
        self.bech32_hrp
            .as_deref()
            .or_else(|| self.preset().and_then(|c| c.bech32_hrp))
    }

    /// The value to place in `TransactionContext::chain_id`.
    pub fn replay_chain_id(&self) -> Option<u64> {
        self.eip155().then_some(self.chain_id)
    }

    pub fn tx_shape(&self) -> TxShape {
        match self.replay_chain_id() {
            Some(chain_id) => TxShape::Eip155 { chain_id },
            None => TxShape::Legacy,
        }
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.chain_id == 0 {
            return Err(WalletError::Config("chain_id must be non-zero".into()));
        }
        if let Some(hrp) = &self.bech32_hrp {
            chain_platon::bech32::encode(hrp, &[])
                .map_err(|e| WalletError::Config(format!("bech32_hrp: {e}")))?;
        }
        Ok(())
    }
}

/// Top-level wallet configuration.
///
/// ```toml
/// [chain]
/// chain_id = 210425
///
/// [submit]
/// rpc_url = "https://openapi2.platon.network/rpc"
/// namespace = "platon"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub chain: ChainConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
}

impl WalletConfig {
    /// Configuration for a preset network using its public RPC endpoint.
    pub fn for_chain(chain: &EvmChain) -> Self {
        Self {
            chain: ChainConfig::from_preset(chain),
            submit: SubmitConfig {
                rpc_url: chain.rpc_url.to_string(),
                namespace: chain.namespace,
                ..Default::default()
            },
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, WalletError> {
        let config: WalletConfig =
            toml::from_str(input).map_err(|e| WalletError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        self.chain.validate()?;
        self.submit.validate()?;
        Ok(())
    }
}

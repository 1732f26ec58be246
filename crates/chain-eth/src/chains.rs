use serde::{Deserialize, Serialize};

use crate::transaction::TxShape;

/// JSON-RPC method namespace spoken by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RpcNamespace {
    #[default]
    Eth,
    Platon,
}

impl RpcNamespace {
    /// Fully qualified method name, e.g. `platon_sendRawTransaction`.
    pub fn method(&self, name: &str) -> String {
        match self {
            RpcNamespace::Eth => format!("eth_{name}"),
            RpcNamespace::Platon => format!("platon_{name}"),
        }
    }
}

/// Definition of an Ethereum-family network.
#[derive(Debug, Clone, Serialize)]
pub struct EvmChain {
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub rpc_url: &'static str,
    /// Whether the network accepts EIP-155 replay-protected transactions.
    pub eip155: bool,
    pub namespace: RpcNamespace,
    /// Human-readable part of Bech32 account addresses, if the network uses them.
    pub bech32_hrp: Option<&'static str>,
    pub is_testnet: bool,
}

impl EvmChain {
    /// Transaction layout to sign for this network.
    pub fn tx_shape(&self) -> TxShape {
        if self.eip155 {
            TxShape::Eip155 {
                chain_id: self.chain_id,
            }
        } else {
            TxShape::Legacy
        }
    }

    /// The value to place in `TransactionContext::chain_id`.
    pub fn replay_chain_id(&self) -> Option<u64> {
        self.eip155.then_some(self.chain_id)
    }
}

/// Ethereum Mainnet (chain ID 1).
pub const ETHEREUM: EvmChain = EvmChain {
    chain_id: 1,
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
    rpc_url: "https://eth.llamarpc.com",
    eip155: true,
    namespace: RpcNamespace::Eth,
    bech32_hrp: None,
    is_testnet: false,
};

/// Sepolia Testnet (chain ID 11155111).
pub const SEPOLIA: EvmChain = EvmChain {
    chain_id: 11155111,
    name: "Sepolia",
    symbol: "ETH",
    decimals: 18,
    rpc_url: "https://rpc.sepolia.org",
    eip155: true,
    namespace: RpcNamespace::Eth,
    bech32_hrp: None,
    is_testnet: true,
};

/// PlatON Mainnet (chain ID 210425).
pub const PLATON_MAINNET: EvmChain = EvmChain {
    chain_id: 210425,
    name: "PlatON",
    symbol: "LAT",
    decimals: 18,
    rpc_url: "https://openapi2.platon.network/rpc",
    eip155: true,
    namespace: RpcNamespace::Platon,
    bech32_hrp: Some("lat"),
    is_testnet: false,
};

/// PlatON Dev Network (chain ID 2206132).
pub const PLATON_DEVNET: EvmChain = EvmChain {
    chain_id: 2206132,
    name: "PlatON Devnet",
    symbol: "LAT",
    decimals: 18,
    rpc_url: "https://devnet2openapi.platon.network/rpc",
    eip155: true,
    namespace: RpcNamespace::Platon,
    bech32_hrp: Some("lat"),
    is_testnet: true,
};

/// All known networks.
const ALL_CHAINS: &[&EvmChain] = &[&ETHEREUM, &SEPOLIA, &PLATON_MAINNET, &PLATON_DEVNET];

/// Returns the chain definition for a given chain ID, or `None` if unknown.
pub fn get_chain(chain_id: u64) -> Option<&'static EvmChain> {
    ALL_CHAINS.iter().find(|c| c.chain_id == chain_id).copied()
}

/// Returns all known chain definitions.
pub fn supported_chains() -> Vec<&'static EvmChain> {
    ALL_CHAINS.to_vec()
}

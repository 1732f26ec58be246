use std::time::Duration;

use chain_eth::chains::RpcNamespace;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SubmitError;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Endpoint and timing settings for the submission service.
///
/// Every field has a default, so a TOML table may set only what differs:
///
/// ```toml
/// rpc_url = "https://openapi2.platon.network/rpc"
/// namespace = "platon"
/// receipt_timeout_ms = 120000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    pub rpc_url: String,
    pub namespace: RpcNamespace,
    /// Delay between receipt polls.
    pub poll_interval_ms: u64,
    /// How long `send_sync` waits for a receipt after submission.
    pub receipt_timeout_ms: u64,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            namespace: RpcNamespace::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            receipt_timeout_ms: DEFAULT_RECEIPT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl SubmitConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, SubmitError> {
        let config: SubmitConfig =
            toml::from_str(input).map_err(|e| SubmitError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SubmitError> {
        self.endpoint()?;

        for (name, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("receipt_timeout_ms", self.receipt_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(SubmitError::Config(format!("{name} must be greater than zero")));
            }
        }

        Ok(())
    }

    /// The parsed RPC endpoint. Only `http` and `https` are accepted.
    pub fn endpoint(&self) -> Result<Url, SubmitError> {
        let url = Url::parse(&self.rpc_url)
            .map_err(|e| SubmitError::Config(format!("invalid rpc_url '{}': {e}", self.rpc_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SubmitError::Config(format!(
                "unsupported rpc_url scheme '{other}'"
            ))),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

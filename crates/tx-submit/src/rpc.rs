use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::B256;
use chain_eth::chains::RpcNamespace;
use serde_json::{json, Value};
use url::Url;

use crate::config::SubmitConfig;
use crate::error::SubmitError;
use crate::receipt::{parse_b256, Receipt};

/// The two node capabilities the submission service needs.
pub trait Transport: Send + Sync {
    /// Broadcasts a signed transaction and returns its hash.
    fn submit_raw_transaction(
        &self,
        raw: &[u8],
    ) -> impl Future<Output = Result<B256, SubmitError>> + Send;

    /// Looks up a receipt; `None` while the transaction is still pending.
    fn get_transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<Option<Receipt>, SubmitError>> + Send;
}

/// JSON-RPC 2.0 over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    namespace: RpcNamespace,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(config: &SubmitConfig) -> Result<Self, SubmitError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SubmitError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.endpoint()?,
            namespace: config.namespace,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn namespace(&self) -> RpcNamespace {
        self.namespace
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, SubmitError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        tracing::trace!(method, id, "rpc request");

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(format!("{method} request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::Transport(format!("{method} response unreadable: {e}")))?;

        parse_response(method, status, &body)
    }
}

/// Extracts `result` from a JSON-RPC response body.
///
/// An `error` object wins over the HTTP status since some nodes pair
/// JSON-RPC errors with 4xx/5xx codes.
fn parse_response(
    method: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> Result<Value, SubmitError> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => {
            return Err(SubmitError::Transport(format!("{method} HTTP {status}")))
        }
        Err(e) => {
            return Err(SubmitError::InvalidResponse(format!(
                "{method} invalid JSON response: {e}"
            )))
        }
    };

    if let Some(err) = value.get("error") {
        return Err(rpc_error(err));
    }
    if !status.is_success() {
        return Err(SubmitError::Transport(format!("{method} HTTP {status}: {value}")));
    }

    value
        .get("result")
        .cloned()
        .ok_or_else(|| SubmitError::InvalidResponse(format!("{method} missing result field")))
}

fn rpc_error(err: &Value) -> SubmitError {
    SubmitError::Rpc {
        code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
        message: err
            .get("message")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| err.to_string()),
    }
}

impl Transport for HttpTransport {
    async fn submit_raw_transaction(&self, raw: &[u8]) -> Result<B256, SubmitError> {
        let method = self.namespace.method("sendRawTransaction");
        let result = self
            .call(&method, json!([format!("0x{}", hex::encode(raw))]))
            .await
            .map_err(|e| match e {
                SubmitError::Rpc { code, message } => {
                    SubmitError::TransactionRejected(format!("{message} (code {code})"))
                }
                other => other,
            })?;

        let hash = result.as_str().ok_or_else(|| {
            SubmitError::InvalidResponse(format!("{method} returned non-string: {result}"))
        })?;
        parse_b256(hash)
    }

    async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, SubmitError> {
        let method = self.namespace.method("getTransactionReceipt");
        let result = self.call(&method, json!([format!("{tx_hash:#x}")])).await?;
        if result.is_null() {
            return Ok(None);
        }
        Receipt::from_json(&result).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn result_is_extracted() {
        let value = parse_response(
            "eth_sendRawTransaction",
            StatusCode::OK,
            r#"{"jsonrpc":"2.0","id":1,"result":"0xabc"}"#,
        )
        .unwrap();
        assert_eq!(value, json!("0xabc"));
    }

    #[test]
    fn null_result_is_preserved() {
        let value = parse_response(
            "eth_getTransactionReceipt",
            StatusCode::OK,
            r#"{"jsonrpc":"2.0","id":1,"result":null}"#,
        )
        .unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn error_object_maps_to_rpc() {
        let err = parse_response(
            "eth_sendRawTransaction",
            StatusCode::OK,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Rpc { code: -32000, ref message } if message == "nonce too low"
        ));
    }

    #[test]
    fn error_object_wins_over_http_status() {
        let err = parse_response(
            "eth_sendRawTransaction",
            StatusCode::BAD_REQUEST,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid params"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SubmitError::Rpc { code: -32602, .. }));
    }

    #[test]
    fn http_failure_without_json_is_transport() {
        let err = parse_response("eth_chainId", StatusCode::BAD_GATEWAY, "<html>bad gateway</html>")
            .unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)));
    }

    #[test]
    fn garbage_body_is_invalid_response() {
        let err = parse_response("eth_chainId", StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, SubmitError::InvalidResponse(_)));
    }

    #[test]
    fn missing_result_is_invalid_response() {
        let err = parse_response("eth_chainId", StatusCode::OK, r#"{"jsonrpc":"2.0","id":1}"#)
            .unwrap_err();
        assert!(matches!(err, SubmitError::InvalidResponse(_)));
    }

    #[test]
    fn transport_uses_configured_namespace() {
        let config = SubmitConfig {
            namespace: RpcNamespace::Platon,
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.namespace(), RpcNamespace::Platon);
        assert_eq!(transport.url().as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SubmitConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(SubmitError::Config(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let config = SubmitConfig {
            rpc_url: "http://127.0.0.1:1".into(),
            request_timeout_ms: 2_000,
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let err = transport.submit_raw_transaction(&[0xc0]).await.unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)), "got {err:?}");
    }
}

use std::time::Duration;

use alloy_primitives::B256;
use chain_eth::transaction::transaction_hash;
use chain_eth::{EncodedStream, StreamShape};

use crate::config::SubmitConfig;
use crate::error::SubmitError;
use crate::receipt::{Receipt, ReceiptStatus};
use crate::rpc::Transport;

/// Broadcasts finalized transactions and optionally waits for them to be
/// mined.
///
/// The service holds no mutable state, so one instance can serve concurrent
/// sends. Nonce ordering between those sends is up to the caller.
pub struct SubmissionService<T> {
    transport: T,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

impl<T: Transport> SubmissionService<T> {
    pub fn new(transport: T, poll_interval: Duration, receipt_timeout: Duration) -> Self {
        Self {
            transport,
            poll_interval,
            receipt_timeout,
        }
    }

    pub fn from_config(transport: T, config: &SubmitConfig) -> Self {
        Self::new(transport, config.poll_interval(), config.receipt_timeout())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn receipt_timeout(&self) -> Duration {
        self.receipt_timeout
    }

    /// Submits the transaction and returns its hash without waiting for
    /// inclusion.
    pub async fn send_async(&self, stream: &EncodedStream) -> Result<B256, SubmitError> {
        if stream.shape() != StreamShape::Signed {
            return Err(SubmitError::UnsignedStream);
        }

        let tx_hash = self.transport.submit_raw_transaction(stream.as_bytes()).await?;
        if !node_hash_matches(stream, &tx_hash) {
            tracing::warn!(
                %tx_hash,
                local = %transaction_hash(stream),
                "node returned a hash that does not match the submitted bytes"
            );
        }
        tracing::info!(%tx_hash, bytes = stream.as_bytes().len(), "transaction submitted");
        Ok(tx_hash)
    }

    /// Submits the transaction and waits up to the configured receipt timeout
    /// for it to be mined.
    pub async fn send_sync(&self, stream: &EncodedStream) -> Result<Receipt, SubmitError> {
        self.send_sync_with_deadline(stream, self.receipt_timeout).await
    }

    /// Like [`send_sync`](Self::send_sync) with a caller-chosen deadline.
    ///
    /// The deadline covers receipt polling only and starts once the node has
    /// accepted the transaction.
    pub async fn send_sync_with_deadline(
        &self,
        stream: &EncodedStream,
        deadline: Duration,
    ) -> Result<Receipt, SubmitError> {
        let tx_hash = self.send_async(stream).await?;

        match tokio::time::timeout(deadline, self.wait_for_receipt(tx_hash)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(%tx_hash, timeout = ?deadline, "receipt not available before deadline");
                Err(SubmitError::ReceiptTimeout {
                    tx_hash,
                    timeout: deadline,
                })
            }
        }
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt, SubmitError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.transport.get_transaction_receipt(tx_hash).await? {
                Some(receipt) if receipt.status == ReceiptStatus::Failed => {
                    tracing::warn!(%tx_hash, block = ?receipt.block_number, "transaction reverted");
                    return Err(SubmitError::TransactionRejected(format!(
                        "{tx_hash} failed in block {}",
                        receipt
                            .block_number
                            .map_or_else(|| "unknown".to_string(), |n| n.to_string())
                    )));
                }
                Some(receipt) => {
                    tracing::info!(%tx_hash, block = ?receipt.block_number, attempt, "receipt received");
                    return Ok(receipt);
                }
                None => {
                    tracing::debug!(%tx_hash, attempt, "receipt pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

fn node_hash_matches(stream: &EncodedStream, node_hash: &B256) -> bool {
    transaction_hash(stream) == *node_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    const TX_HASH: B256 = B256::repeat_byte(0xab);

    /// Scripted transport: receipt lookups pop from a queue and return `None`
    /// once it is empty.
    #[derive(Default)]
    struct MockTransport {
        submit_error: Mutex<Option<SubmitError>>,
        receipts: Mutex<VecDeque<Result<Option<Receipt>, SubmitError>>>,
        submitted: Mutex<Vec<Vec<u8>>>,
        polls: Mutex<u32>,
    }

    impl MockTransport {
        fn with_receipts(receipts: Vec<Result<Option<Receipt>, SubmitError>>) -> Self {
            Self {
                receipts: Mutex::new(receipts.into()),
                ..Default::default()
            }
        }
    }

    impl Transport for MockTransport {
        async fn submit_raw_transaction(&self, raw: &[u8]) -> Result<B256, SubmitError> {
            self.submitted.lock().unwrap().push(raw.to_vec());
            match self.submit_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(TX_HASH),
            }
        }

        async fn get_transaction_receipt(&self, _tx_hash: B256) -> Result<Option<Receipt>, SubmitError> {
            *self.polls.lock().unwrap() += 1;
            self.receipts.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    fn receipt(status: ReceiptStatus) -> Receipt {
        Receipt {
            transaction_hash: TX_HASH,
            block_hash: Some(B256::repeat_byte(0x01)),
            block_number: Some(42),
            gas_used: None,
            contract_address: None,
            status,
        }
    }

    fn signed_stream() -> EncodedStream {
        EncodedStream::new(StreamShape::Signed, vec![0xc0])
    }

    fn service(transport: MockTransport) -> SubmissionService<MockTransport> {
        SubmissionService::new(transport, Duration::from_secs(1), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn send_async_returns_hash_without_polling() {
        let svc = service(MockTransport::default());
        let hash = svc.send_async(&signed_stream()).await.unwrap();

        assert_eq!(hash, TX_HASH);
        assert_eq!(*svc.transport().submitted.lock().unwrap(), vec![vec![0xc0]]);
        assert_eq!(*svc.transport().polls.lock().unwrap(), 0);
    }

    #[test]
    fn node_hash_is_checked_against_local_keccak() {
        let stream = signed_stream();
        assert!(node_hash_matches(&stream, &transaction_hash(&stream)));
        assert!(!node_hash_matches(&stream, &TX_HASH));
    }

    #[tokio::test]
    async fn mismatched_node_hash_is_still_returned() {
        let svc = service(MockTransport::default());
        let stream = signed_stream();
        let hash = svc.send_async(&stream).await.unwrap();

        assert_ne!(hash, transaction_hash(&stream));
        assert_eq!(hash, TX_HASH);
    }

    #[tokio::test]
    async fn unsigned_stream_is_not_sent() {
        let svc = service(MockTransport::default());
        let stream = EncodedStream::new(StreamShape::SigningPayload, vec![0xc0]);

        let err = svc.send_async(&stream).await.unwrap_err();
        assert!(matches!(err, SubmitError::UnsignedStream));
        assert!(svc.transport().submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_rejection_is_surfaced() {
        let transport = MockTransport::default();
        *transport.submit_error.lock().unwrap() =
            Some(SubmitError::TransactionRejected("nonce too low".into()));
        let svc = service(transport);

        let err = svc.send_sync(&signed_stream()).await.unwrap_err();
        assert!(matches!(err, SubmitError::TransactionRejected(_)));
        assert_eq!(*svc.transport().polls.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn send_sync_polls_until_receipt() {
        let svc = service(MockTransport::with_receipts(vec![
            Ok(None),
            Ok(None),
            Ok(Some(receipt(ReceiptStatus::Success))),
        ]));

        let start = Instant::now();
        let got = svc.send_sync(&signed_stream()).await.unwrap();

        assert_eq!(got.block_number, Some(42));
        assert_eq!(*svc.transport().polls.lock().unwrap(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_receipt_is_rejection() {
        let svc = service(MockTransport::with_receipts(vec![Ok(Some(receipt(
            ReceiptStatus::Failed,
        )))]));

        let err = svc.send_sync(&signed_stream()).await.unwrap_err();
        assert!(matches!(err, SubmitError::TransactionRejected(ref m) if m.contains("block 42")));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_counts_as_mined() {
        let svc = service(MockTransport::with_receipts(vec![Ok(Some(receipt(
            ReceiptStatus::Unknown,
        )))]));

        let got = svc.send_sync(&signed_stream()).await.unwrap();
        assert_eq!(got.status, ReceiptStatus::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_receipt_times_out_at_deadline() {
        let svc = service(MockTransport::default());

        let start = Instant::now();
        let err = svc.send_sync(&signed_stream()).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(
            matches!(err, SubmitError::ReceiptTimeout { tx_hash, timeout } if tx_hash == TX_HASH && timeout == Duration::from_secs(60))
        );
        assert!(elapsed >= Duration::from_secs(60), "fired early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(61), "fired late: {elapsed:?}");
        assert!(*svc.transport().polls.lock().unwrap() >= 60);
    }

    #[tokio::test(start_paused = true)]
    async fn caller_deadline_overrides_config() {
        let svc = service(MockTransport::default());

        let start = Instant::now();
        let err = svc
            .send_sync_with_deadline(&signed_stream(), Duration::from_millis(2_500))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::ReceiptTimeout { .. }));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2_500) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_while_polling_is_surfaced() {
        let svc = service(MockTransport::with_receipts(vec![
            Ok(None),
            Err(SubmitError::Transport("connection reset".into())),
        ]));

        let err = svc.send_sync(&signed_stream()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)));
        assert_eq!(*svc.transport().polls.lock().unwrap(), 2);
    }

    #[test]
    fn from_config_uses_configured_timing() {
        let config = SubmitConfig {
            poll_interval_ms: 250,
            receipt_timeout_ms: 10_000,
            ..Default::default()
        };
        let svc = SubmissionService::from_config(MockTransport::default(), &config);
        assert_eq!(svc.poll_interval(), Duration::from_millis(250));
        assert_eq!(svc.receipt_timeout(), Duration::from_secs(10));
    }
}

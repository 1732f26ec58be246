//! Broadcasting signed transactions over JSON-RPC and waiting for receipts.
//!
//! [`SubmissionService`] drives any [`Transport`]; [`HttpTransport`] is the
//! production implementation speaking `eth_*` or `platon_*` methods.

pub mod config;
pub mod error;
pub mod receipt;
pub mod rpc;
pub mod service;

pub use config::SubmitConfig;
pub use error::SubmitError;
pub use receipt::{Receipt, ReceiptStatus};
pub use rpc::{HttpTransport, Transport};
pub use service::SubmissionService;

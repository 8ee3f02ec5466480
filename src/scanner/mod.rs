mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::MirrorNodeClient;

use crate::types::{ContractCallRequest, ContractsPage, RawContractDetail};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("error occurred while sending request: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("unexpected status code: {status_code} - {msg}")]
    UnexpectedStatusCode {
        status_code: reqwest::StatusCode,
        msg: String,
    },
    #[error("deserializing response failed: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Read access to the mirror node.
///
/// Rate limiting is handled inside the implementation; every other failure
/// is logged and reported as `None`.
#[async_trait]
pub trait ContractSource: Send + Sync {
    /// Fetches one page of contracts. `None` cursor requests the first page.
    async fn fetch_page(&self, cursor: Option<&str>) -> Option<ContractsPage>;

    /// Fetches a contract by its contract id or evm address.
    async fn fetch_detail(&self, contract_id: &str) -> Option<RawContractDetail>;

    /// Executes a read-only contract call and returns the raw `result` hex string.
    async fn call(&self, request: &ContractCallRequest) -> Option<String>;
}

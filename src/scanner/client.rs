use super::{ContractSource, ScanError};
use crate::{
    consts::{
        CONTRACT_CALL_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_DELAY_MS,
        GET_CONTRACTS_ENDPOINT, LIMIT_PARAM_REGEX, MAX_SCAN_CONTRACT_LIMIT,
    },
    settings::Settings,
    types::{ContractCallRequest, ContractCallResponse, ContractsPage, RawContractDetail},
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct MirrorNodeClient {
    rest_url: Url,
    web3_url: Url,
    scan_contract_limit: u32,
    retry_delay: Duration,
    http_client: reqwest::Client,
}

impl MirrorNodeClient {
    pub fn new(rest_url: Url, web3_url: Url) -> Result<Self, ScanError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            rest_url,
            web3_url,
            scan_contract_limit: MAX_SCAN_CONTRACT_LIMIT,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            http_client,
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = Self::new(settings.rest_url()?, settings.web3_url()?)?
            .with_scan_contract_limit(settings.scan_contract_limit)
            .with_retry_delay(settings.retry_delay())
            .with_request_timeout(settings.request_timeout())?;
        Ok(client)
    }

    pub fn with_scan_contract_limit(mut self, scan_contract_limit: u32) -> Self {
        self.scan_contract_limit = scan_contract_limit;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, ScanError> {
        self.http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Url of the page identified by `cursor`, with its page size replaced
    /// by the configured limit.
    pub fn page_url(&self, cursor: Option<&str>) -> Result<Url, ScanError> {
        let path = match cursor {
            Some(next) => LIMIT_PARAM_REGEX
                .replace(next, format!("${{1}}{}", self.scan_contract_limit))
                .into_owned(),
            None => format!(
                "{GET_CONTRACTS_ENDPOINT}?limit={}&order=asc",
                self.scan_contract_limit
            ),
        };
        endpoint_url(&self.rest_url, &path)
    }

    pub async fn try_fetch_page(&self, cursor: Option<&str>) -> Result<ContractsPage, ScanError> {
        let url = self.page_url(cursor)?;
        log::info!("fetching contract batch from url: {url}");
        self.send_with_retry(|| self.http_client.get(url.clone()))
            .await
    }

    pub async fn try_fetch_detail(&self, contract_id: &str) -> Result<RawContractDetail, ScanError> {
        let url = endpoint_url(
            &self.rest_url,
            &format!("{GET_CONTRACTS_ENDPOINT}/{contract_id}"),
        )?;
        self.send_with_retry(|| self.http_client.get(url.clone()))
            .await
    }

    pub async fn try_call(&self, request: &ContractCallRequest) -> Result<String, ScanError> {
        let url = endpoint_url(&self.web3_url, CONTRACT_CALL_ENDPOINT)?;
        let response: ContractCallResponse = self
            .send_with_retry(|| self.http_client.post(url.clone()).json(request))
            .await?;
        Ok(response.result)
    }

    /// Sends the request built by `make_request`, re-sending an identical
    /// request after a fixed delay for as long as the server answers 429.
    /// There is neither a retry cap nor backoff growth.
    async fn send_with_retry<T, F>(&self, make_request: F) -> Result<T, ScanError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        loop {
            let response = make_request().send().await?;
            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    log::warn!(
                        "rate limit exceeded for {}; retrying in {:?}",
                        response.url(),
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                StatusCode::NOT_FOUND => {
                    return Err(ScanError::NotFound(response.url().to_string()));
                }
                status if status.is_success() => {
                    let body = response.text().await?;
                    return Ok(serde_json::from_str(&body)?);
                }
                status_code => {
                    return Err(ScanError::UnexpectedStatusCode {
                        status_code,
                        msg: response.text().await.unwrap_or_default(),
                    });
                }
            }
        }
    }
}

/// Appends `path_and_query` to the path of `base`, so a mirror node served
/// under a path prefix keeps it.
fn endpoint_url(base: &Url, path_and_query: &str) -> Result<Url, ScanError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    let base = url.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}{path_and_query}"))?)
}

fn log_failure(operation: &str, target: &str, err: &ScanError) {
    match err {
        ScanError::NotFound(_) => log::warn!("{operation} failed for {target}: {err}"),
        _ => log::error!("{operation} failed for {target}: {err}"),
    }
}

#[async_trait]
impl ContractSource for MirrorNodeClient {
    async fn fetch_page(&self, cursor: Option<&str>) -> Option<ContractsPage> {
        self.try_fetch_page(cursor)
            .await
            .map_err(|err| log_failure("fetching contracts", cursor.unwrap_or("genesis"), &err))
            .ok()
    }

    async fn fetch_detail(&self, contract_id: &str) -> Option<RawContractDetail> {
        self.try_fetch_detail(contract_id)
            .await
            .map_err(|err| log_failure("fetching contract", contract_id, &err))
            .ok()
    }

    async fn call(&self, request: &ContractCallRequest) -> Option<String> {
        self.try_call(request)
            .await
            .map_err(|err| log_failure("contract call", &request.to, &err))
            .ok()
    }
}

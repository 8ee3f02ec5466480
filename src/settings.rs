use crate::{
    consts::{
        self, DEFAULT_LOCAL_MIRROR_NODE_URL, DEFAULT_REGISTRY_DIR, DEFAULT_REQUEST_TIMEOUT_SECS,
        DEFAULT_RETRY_DELAY_MS, MAX_SCAN_CONTRACT_LIMIT, PRODUCTION_NETWORKS,
    },
    starting_point::StartingPoint,
};
use config::{Config, File};
use serde::Deserialize;
use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;
use url::Url;

pub const SERVICE_NAME: &str = "ERC_INDEXER";
pub const CONFIG_PATH_ENV: &str = "ERC_INDEXER_CONFIG";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("network is not properly configured: network={0}")]
    InvalidNetwork(String),
    #[error("{key} is not properly configured: {key}={url}")]
    InvalidMirrorNodeUrl { key: &'static str, url: String },
    #[error("starting_point is not properly configured: starting_point={0}")]
    InvalidStartingPoint(String),
    #[error("scan_contract_limit must be within [1, {}]: scan_contract_limit={0}", MAX_SCAN_CONTRACT_LIMIT)]
    InvalidScanContractLimit(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub network: String,
    pub mirror_node_url: String,
    pub mirror_node_url_web3: String,
    pub starting_point: Option<String>,
    pub scan_contract_limit: u32,
    pub detection_only: bool,
    pub registry_dir: PathBuf,
    pub retry_delay_ms: u64,
    /// Timeout of a single HTTP request.
    pub request_timeout_secs: u64,
    pub max_pages: Option<NonZeroUsize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: String::new(),
            mirror_node_url: String::new(),
            mirror_node_url_web3: String::new(),
            starting_point: None,
            scan_contract_limit: MAX_SCAN_CONTRACT_LIMIT,
            detection_only: false,
            registry_dir: PathBuf::from(DEFAULT_REGISTRY_DIR),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_pages: None,
        }
    }
}

impl Settings {
    /// Reads the optional config file and `ERC_INDEXER__*` environment
    /// variables, then validates the result.
    pub fn build(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let env_config_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);

        let mut builder = Config::builder();
        if let Some(config_path) = config_path.map(Path::to_path_buf).or(env_config_path) {
            builder = builder.add_source(File::from(config_path));
        }
        // `__` separates nested keys, so keys with underscores stay addressable
        builder = builder.add_source(config::Environment::with_prefix(SERVICE_NAME).separator("__"));

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !consts::NETWORK_REGEX.is_match(&self.network) {
            return Err(SettingsError::InvalidNetwork(self.network.clone()));
        }

        if self.is_production() {
            for (key, url) in [
                ("mirror_node_url", &self.mirror_node_url),
                ("mirror_node_url_web3", &self.mirror_node_url_web3),
            ] {
                if !consts::MIRROR_NODE_URL_REGEX.is_match(url) {
                    return Err(SettingsError::InvalidMirrorNodeUrl {
                        key,
                        url: url.clone(),
                    });
                }
            }
        }

        self.starting_point()?;

        if !(1..=MAX_SCAN_CONTRACT_LIMIT).contains(&self.scan_contract_limit) {
            return Err(SettingsError::InvalidScanContractLimit(
                self.scan_contract_limit,
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        PRODUCTION_NETWORKS.contains(&self.network.as_str())
    }

    pub fn starting_point(&self) -> Result<StartingPoint, SettingsError> {
        StartingPoint::from_str(self.starting_point.as_deref().unwrap_or_default())
    }

    /// Base url of the REST API. Development networks fall back to the local node.
    pub fn rest_url(&self) -> Result<Url, SettingsError> {
        let url = match self.mirror_node_url.as_str() {
            "" if !self.is_production() => DEFAULT_LOCAL_MIRROR_NODE_URL,
            url => url,
        };
        Url::from_str(url).map_err(|_| SettingsError::InvalidMirrorNodeUrl {
            key: "mirror_node_url",
            url: url.to_string(),
        })
    }

    /// Base url of the web3 (contract call) API. Falls back to the REST url.
    pub fn web3_url(&self) -> Result<Url, SettingsError> {
        match self.mirror_node_url_web3.as_str() {
            "" => self.rest_url(),
            url => Url::from_str(url).map_err(|_| SettingsError::InvalidMirrorNodeUrl {
                key: "mirror_node_url_web3",
                url: url.to_string(),
            }),
        }
    }

    /// Directory holding the registries and the cursor of the configured network.
    pub fn network_registry_dir(&self) -> PathBuf {
        self.registry_dir.join(&self.network)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

use crate::consts::{self, EMPTY_BYTECODE};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Ledger entity id in `shard.realm.num` form.
///
/// `num` is assigned monotonically by the ledger and is used as the
/// ordering key of every registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl ContractId {
    pub fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    pub fn ordering_key(&self) -> u64 {
        self.num
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid contract id: {0}")]
pub struct ParseContractIdError(String);

impl FromStr for ContractId {
    type Err = ParseContractIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseContractIdError(s.to_string());
        if !consts::CONTRACT_ID_REGEX.is_match(s) {
            return Err(err());
        }
        let mut parts = s.split('.').map(u64::from_str);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(shard)), Some(Ok(realm)), Some(Ok(num))) => Ok(Self::new(shard, realm, num)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

/// Token standards the indexer keeps a registry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Standard {
    Erc20,
    Erc721,
    Erc1155,
}

impl Standard {
    pub const ALL: [Standard; 3] = [Standard::Erc20, Standard::Erc721, Standard::Erc1155];

    pub fn registry_file_name(&self) -> &'static str {
        match self {
            Standard::Erc20 => consts::ERC_20_JSON_FILE_NAME,
            Standard::Erc721 => consts::ERC_721_JSON_FILE_NAME,
            Standard::Erc1155 => consts::ERC_1155_JSON_FILE_NAME,
        }
    }

    pub fn signatures(&self) -> &'static [&'static str] {
        match self {
            Standard::Erc20 => consts::ERC_20_SIGNATURES,
            Standard::Erc721 => consts::ERC_721_SIGNATURES,
            Standard::Erc1155 => consts::ERC_1155_SIGNATURES,
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Standard::Erc20 => "ERC20",
            Standard::Erc721 => "ERC721",
            Standard::Erc1155 => "ERC1155",
        };
        f.write_str(name)
    }
}

/// Contract summary as returned by the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractRecord {
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub evm_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractsPage {
    #[serde(default)]
    pub contracts: Vec<ContractRecord>,
    #[serde(default)]
    pub links: Links,
}

/// Contract object as returned by the detail endpoint. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawContractDetail {
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub evm_address: Option<String>,
    #[serde(default)]
    pub bytecode: Option<String>,
    #[serde(default)]
    pub runtime_bytecode: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetailError {
    #[error("contract {contract_id:?} is missing fields: {missing:?}")]
    MissingFields {
        contract_id: Option<String>,
        missing: Vec<&'static str>,
    },
    #[error(transparent)]
    ContractId(#[from] ParseContractIdError),
}

/// Contract detail that passed the completeness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDetail {
    pub contract_id: ContractId,
    pub evm_address: String,
    pub bytecode: String,
    pub runtime_bytecode: String,
}

impl ContractDetail {
    /// Runtime bytecode unless it is empty, creation bytecode otherwise.
    /// `None` when neither carries code.
    pub fn analyzable_bytecode(&self) -> Option<&str> {
        let bytecode = if self.runtime_bytecode == EMPTY_BYTECODE {
            self.bytecode.as_str()
        } else {
            self.runtime_bytecode.as_str()
        };
        (bytecode != EMPTY_BYTECODE).then_some(bytecode)
    }
}

impl TryFrom<RawContractDetail> for ContractDetail {
    type Error = DetailError;

    fn try_from(raw: RawContractDetail) -> Result<Self, Self::Error> {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().map_or(false, |v| !v.is_empty())
        }

        let missing: Vec<&'static str> = [
            ("contract_id", present(&raw.contract_id)),
            ("evm_address", present(&raw.evm_address)),
            ("bytecode", present(&raw.bytecode)),
            ("runtime_bytecode", present(&raw.runtime_bytecode)),
        ]
        .into_iter()
        .filter_map(|(field, present)| (!present).then_some(field))
        .collect();

        match raw {
            RawContractDetail {
                contract_id: Some(contract_id),
                evm_address: Some(evm_address),
                bytecode: Some(bytecode),
                runtime_bytecode: Some(runtime_bytecode),
            } if missing.is_empty() => Ok(Self {
                contract_id: ContractId::from_str(&contract_id)?,
                evm_address,
                bytecode,
                runtime_bytecode,
            }),
            raw => Err(DetailError::MissingFields {
                contract_id: raw.contract_id,
                missing,
            }),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRecord {
    pub address: String,
    #[serde(with = "serde_with::rust::display_fromstr")]
    pub contract_id: ContractId,
}

impl ClassifiedRecord {
    pub fn new(address: impl Into<String>, contract_id: ContractId) -> Self {
        Self {
            address: address.into(),
            contract_id,
        }
    }

    pub fn ordering_key(&self) -> u64 {
        self.contract_id.ordering_key()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCallRequest {
    pub data: String,
    pub to: String,
    pub block: String,
}

impl ContractCallRequest {
    pub fn new(to: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            to: to.into(),
            block: "latest".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContractCallResponse {
    pub result: String,
}

use lazy_static::lazy_static;
use regex::Regex;

pub const GET_CONTRACTS_ENDPOINT: &str = "/api/v1/contracts";
pub const CONTRACT_CALL_ENDPOINT: &str = "/api/v1/contracts/call";

pub const ERC_20_JSON_FILE_NAME: &str = "erc-20.json";
pub const ERC_721_JSON_FILE_NAME: &str = "erc-721.json";
pub const ERC_1155_JSON_FILE_NAME: &str = "erc-1155.json";
pub const NEXT_POINTER_JSON_FILE_NAME: &str = "next-pointer.json";

pub const PRODUCTION_NETWORKS: [&str; 3] = ["previewnet", "testnet", "mainnet"];
pub const DEFAULT_LOCAL_MIRROR_NODE_URL: &str = "http://127.0.0.1:5551";

pub const DEFAULT_REGISTRY_DIR: &str = "erc-registry";
pub const DEFAULT_RETRY_DELAY_MS: u64 = 9000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MAX_SCAN_CONTRACT_LIMIT: u32 = 100;

/// Runtime (or creation) bytecode of an account without code.
pub const EMPTY_BYTECODE: &str = "0x";

lazy_static! {
    pub static ref NETWORK_REGEX: Regex =
        Regex::new(r"^(local-node|previewnet|testnet|mainnet)$").unwrap();
    pub static ref MIRROR_NODE_URL_REGEX: Regex =
        Regex::new(r"^https://(previewnet|testnet|mainnet)\.mirrornode\.hedera\.com$").unwrap();
    pub static ref NEXT_POINTER_REGEX: Regex = Regex::new(
        r"^/api/v1/contracts\?limit=\d+&order=asc&contract\.id=(gt|gte):\d+\.\d+\.\d+$"
    )
    .unwrap();
    pub static ref CONTRACT_ID_REGEX: Regex = Regex::new(r"^\d+\.\d+\.\d+$").unwrap();
    pub static ref EVM_ADDRESS_REGEX: Regex = Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap();
    pub static ref LIMIT_PARAM_REGEX: Regex = Regex::new(r"(limit=)\d+").unwrap();
}

/// Function selectors and event topics every ERC-20 token exposes.
///
/// Selectors: allowance, approve, balanceOf, totalSupply, transfer, transferFrom.
/// Topics: Approval, Transfer.
pub const ERC_20_SIGNATURES: &[&str] = &[
    "dd62ed3e",
    "095ea7b3",
    "70a08231",
    "18160ddd",
    "a9059cbb",
    "23b872dd",
    "8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925",
    "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
];

/// Selectors: approve, balanceOf, getApproved, isApprovedForAll, ownerOf,
/// safeTransferFrom (both overloads), setApprovalForAll, supportsInterface, transferFrom.
/// Topics: Approval, ApprovalForAll, Transfer.
pub const ERC_721_SIGNATURES: &[&str] = &[
    "095ea7b3",
    "70a08231",
    "081812fc",
    "e985e9c5",
    "6352211e",
    "42842e0e",
    "b88d4fde",
    "a22cb465",
    "01ffc9a7",
    "23b872dd",
    "8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925",
    "17307eab39ab6107e8899845ad3d59bd9653f200f220920489ca2b5937696c31",
    "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
];

/// Selectors: balanceOf, balanceOfBatch, setApprovalForAll, isApprovedForAll,
/// safeTransferFrom, safeBatchTransferFrom.
/// Topics: TransferSingle, TransferBatch, ApprovalForAll.
pub const ERC_1155_SIGNATURES: &[&str] = &[
    "00fdd58e",
    "4e1273f4",
    "a22cb465",
    "e985e9c5",
    "f242432a",
    "2eb2c2d6",
    "c3d58168c5ae7397731d063d5bbf3d657854427343f4c083240f7aacaa2d0f62",
    "4a39dc06d4c0dbc64b70af90fd698a233a518aa5d07e595d983b8c0526c8f7fb",
    "17307eab39ab6107e8899845ad3d59bd9653f200f220920489ca2b5937696c31",
];

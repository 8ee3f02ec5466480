use super::ContractSource;
use crate::types::{ContractCallRequest, ContractsPage, RawContractDetail};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Mutex};

/// In-memory mirror node. Unknown pages and contracts yield `None`.
#[derive(Debug, Default)]
pub struct FakeSource {
    pub pages: HashMap<Option<String>, ContractsPage>,
    pub details: HashMap<String, RawContractDetail>,
    pub fetched_pages: Mutex<Vec<Option<String>>>,
}

impl FakeSource {
    pub fn with_detail(mut self, detail: RawContractDetail) -> Self {
        let contract_id = detail.contract_id.clone().unwrap_or_default();
        if let Some(address) = detail.evm_address.clone() {
            self.details.insert(address, detail.clone());
        }
        self.details.insert(contract_id, detail);
        self
    }

    pub fn with_page(mut self, cursor: Option<&str>, page: ContractsPage) -> Self {
        self.pages.insert(cursor.map(str::to_string), page);
        self
    }

    pub fn fetched_pages(&self) -> Vec<Option<String>> {
        self.fetched_pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractSource for FakeSource {
    async fn fetch_page(&self, cursor: Option<&str>) -> Option<ContractsPage> {
        let cursor = cursor.map(str::to_string);
        self.fetched_pages.lock().unwrap().push(cursor.clone());
        self.pages.get(&cursor).cloned()
    }

    async fn fetch_detail(&self, contract_id: &str) -> Option<RawContractDetail> {
        self.details.get(contract_id).cloned()
    }

    async fn call(&self, _request: &ContractCallRequest) -> Option<String> {
        None
    }
}

mod signatures;

#[cfg(test)]
pub(crate) use signatures::bytecode_implementing;
pub use signatures::{Classify, SignatureClassifier};

use crate::{
    scanner::ContractSource,
    types::{ClassifiedRecord, ContractDetail, ContractRecord, RawContractDetail, Standard},
};
use futures::future;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("none of the {0} contract details of the page could be fetched")]
    PageUnavailable(usize),
}

/// Classified records of one page, bucketed by standard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedBatch {
    by_standard: BTreeMap<Standard, Vec<ClassifiedRecord>>,
}

impl ClassifiedBatch {
    pub fn push(&mut self, standard: Standard, record: ClassifiedRecord) {
        self.by_standard.entry(standard).or_default().push(record);
    }

    pub fn records(&self, standard: Standard) -> &[ClassifiedRecord] {
        self.by_standard
            .get(&standard)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Standard, &[ClassifiedRecord])> {
        self.by_standard
            .iter()
            .map(|(standard, records)| (*standard, records.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.by_standard.values().all(Vec::is_empty)
    }
}

struct Analysis {
    detail: ContractDetail,
    standards: BTreeSet<Standard>,
}

pub struct BytecodeAnalyzer<C = SignatureClassifier> {
    classifier: C,
}

impl<C: Classify> BytecodeAnalyzer<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// Fetches the detail of every record concurrently and classifies its
    /// bytecode. Unusable records are logged and skipped; only a page whose
    /// every detail fetch failed is an error.
    pub async fn classify_batch<S>(
        &self,
        source: &S,
        records: &[ContractRecord],
    ) -> Result<ClassifiedBatch, AnalyzeError>
    where
        S: ContractSource + ?Sized,
    {
        let contract_ids: Vec<&str> = records
            .iter()
            .filter_map(|record| match record.contract_id.as_deref() {
                Some(contract_id) if !contract_id.is_empty() => Some(contract_id),
                _ => {
                    log::warn!("skipping contract without contract_id: {record:?}");
                    None
                }
            })
            .collect();

        let results = future::join_all(contract_ids.iter().map(|contract_id| async move {
            source
                .fetch_detail(contract_id)
                .await
                .map(|raw| self.analyze(raw))
        }))
        .await;

        let fetched = results.iter().filter(|result| result.is_some()).count();
        if fetched == 0 && !contract_ids.is_empty() {
            return Err(AnalyzeError::PageUnavailable(contract_ids.len()));
        }

        let mut batch = ClassifiedBatch::default();
        for Analysis { detail, standards } in results.into_iter().flatten().flatten() {
            for standard in standards {
                batch.push(
                    standard,
                    ClassifiedRecord::new(detail.evm_address.clone(), detail.contract_id),
                );
            }
        }
        Ok(batch)
    }

    fn analyze(&self, raw: RawContractDetail) -> Option<Analysis> {
        let detail = match ContractDetail::try_from(raw) {
            Ok(detail) => detail,
            Err(err) => {
                log::warn!("skipping contract: {err}");
                return None;
            }
        };
        let Some(bytecode) = detail.analyzable_bytecode() else {
            log::debug!("skipping contract {}: no bytecode", detail.contract_id);
            return None;
        };
        match self.classifier.classify(bytecode) {
            Ok(standards) => {
                log::debug!(
                    "analyzed contract {}: standards={standards:?}",
                    detail.contract_id
                );
                Some(Analysis { detail, standards })
            }
            Err(err) => {
                log::warn!(
                    "classification of contract {} failed: {err:#}",
                    detail.contract_id
                );
                None
            }
        }
    }
}

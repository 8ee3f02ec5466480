use crate::{
    analyzer::{BytecodeAnalyzer, ClassifiedBatch, Classify, SignatureClassifier},
    registry::{RegistryError, RegistryGenerator},
    scanner::ContractSource,
    types::Standard,
};
use std::{collections::BTreeMap, fmt, num::NonZeroUsize, sync::Arc};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cursor chain has no further pages.
    Exhausted,
    PageLimit,
    /// A page of the contract list could not be fetched.
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingSummary {
    pub pages: usize,
    /// Pages whose contract details could not be fetched at all. They are
    /// passed over so a permanently broken contract cannot stall indexing.
    pub skipped_pages: usize,
    pub contracts: usize,
    pub detections: BTreeMap<Standard, usize>,
    /// Cursor of the first page that was not processed, `None` at the end of the chain.
    pub next_cursor: Option<String>,
    pub stop_reason: StopReason,
}

impl IndexingSummary {
    fn record_page(&mut self, contracts: usize, batch: &ClassifiedBatch) {
        self.pages += 1;
        self.contracts += contracts;
        for (standard, records) in batch.iter() {
            *self.detections.entry(standard).or_default() += records.len();
        }
    }
}

impl fmt::Display for IndexingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "indexing stopped ({:?}): pages={}, skipped_pages={}, contracts={}",
            self.stop_reason, self.pages, self.skipped_pages, self.contracts
        )?;
        for standard in Standard::ALL {
            let count = self.detections.get(&standard).copied().unwrap_or_default();
            write!(f, ", {standard}={count}")?;
        }
        Ok(())
    }
}

/// Drives the scan one page at a time: fetch, classify, merge, persist cursor.
pub struct Indexer<S, C = SignatureClassifier> {
    source: Arc<S>,
    analyzer: BytecodeAnalyzer<C>,
    registry: RegistryGenerator,
    detection_only: bool,
    max_pages: Option<NonZeroUsize>,
    shutdown: CancellationToken,
}

impl<S, C> Indexer<S, C>
where
    S: ContractSource,
    C: Classify,
{
    pub fn new(source: Arc<S>, analyzer: BytecodeAnalyzer<C>, registry: RegistryGenerator) -> Self {
        Self {
            source,
            analyzer,
            registry,
            detection_only: false,
            max_pages: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_detection_only(mut self, detection_only: bool) -> Self {
        self.detection_only = detection_only;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<NonZeroUsize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Processes pages starting at `start` (`None` is genesis) until the
    /// chain ends, a page cannot be fetched, the page cap is hit or shutdown
    /// is requested.
    ///
    /// The cursor is persisted only after every registry of the page has
    /// been merged, so a crash leads to the page being processed again.
    /// A page whose contract details are all unavailable is logged and
    /// passed over. Only storage failures are returned as errors.
    pub async fn run(&self, start: Option<String>) -> Result<IndexingSummary, RegistryError> {
        let mut summary = IndexingSummary {
            pages: 0,
            skipped_pages: 0,
            contracts: 0,
            detections: BTreeMap::new(),
            next_cursor: None,
            stop_reason: StopReason::Exhausted,
        };
        let mut cursor = start;

        let stop_reason = loop {
            if self.shutdown.is_cancelled() {
                break StopReason::Cancelled;
            }
            if let Some(max_pages) = self.max_pages {
                if summary.pages >= max_pages.get() {
                    break StopReason::PageLimit;
                }
            }

            // nothing is written before the page arrives, so waiting for it is interruptible
            let page = tokio::select! {
                _ = self.shutdown.cancelled() => break StopReason::Cancelled,
                page = self.source.fetch_page(cursor.as_deref()) => page,
            };
            let page = match page {
                Some(page) => page,
                None => {
                    log::error!(
                        "page fetch failed: cursor={}",
                        cursor.as_deref().unwrap_or("genesis")
                    );
                    break StopReason::Failed;
                }
            };
            if page.contracts.is_empty() {
                log::info!("no contracts left to index");
                break StopReason::Exhausted;
            }

            let batch = match self
                .analyzer
                .classify_batch(self.source.as_ref(), &page.contracts)
                .await
            {
                Ok(batch) => batch,
                Err(err) => {
                    log::error!(
                        "skipping page: cursor={}: {err}",
                        cursor.as_deref().unwrap_or("genesis")
                    );
                    summary.skipped_pages += 1;
                    ClassifiedBatch::default()
                }
            };
            summary.record_page(page.contracts.len(), &batch);

            if self.detection_only {
                log_detections(&batch);
            } else {
                self.registry.generate_registries(&batch).await?;
                self.registry.update_cursor(page.links.next.as_deref()).await?;
            }

            match page.links.next {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => {
                    cursor = None;
                    log::info!("reached the last page");
                    break StopReason::Exhausted;
                }
            }
        };

        summary.next_cursor = cursor;
        summary.stop_reason = stop_reason;
        Ok(summary)
    }
}

fn log_detections(batch: &ClassifiedBatch) {
    for (standard, records) in batch.iter() {
        for record in records {
            log::info!(
                "detected {standard} contract: contract_id={}, address={}",
                record.contract_id,
                record.address
            );
        }
    }
}

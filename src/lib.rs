mod consts;

pub mod analyzer;
pub mod indexer;
pub mod registry;
pub mod scanner;
pub mod settings;
pub mod starting_point;
pub mod types;

pub use analyzer::{BytecodeAnalyzer, ClassifiedBatch, Classify, SignatureClassifier};
pub use indexer::{Indexer, IndexingSummary, StopReason};
pub use registry::{RegistryError, RegistryGenerator};
pub use scanner::{ContractSource, MirrorNodeClient, ScanError};
pub use settings::{Settings, SettingsError};
pub use starting_point::{resolve_starting_point, ResolveError, StartingPoint};

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Indexes the configured network until the contract list is exhausted,
/// a list page cannot be fetched, the page cap is reached or `shutdown`
/// is cancelled.
pub async fn run(settings: Settings, shutdown: CancellationToken) -> anyhow::Result<IndexingSummary> {
    let starting_point = settings.starting_point()?;
    let source = Arc::new(
        MirrorNodeClient::from_settings(&settings).context("mirror node client initialization")?,
    );
    let registry = RegistryGenerator::new(settings.network_registry_dir());

    let start = resolve_starting_point(&starting_point, source.as_ref(), &registry)
        .await
        .context("starting point resolution")?;

    if settings.detection_only {
        log::info!("detection only mode: registries and next pointer are not updated");
    }
    let analyzer = BytecodeAnalyzer::new(SignatureClassifier::new()?);
    let summary = Indexer::new(source, analyzer, registry)
        .with_detection_only(settings.detection_only)
        .with_max_pages(settings.max_pages)
        .with_shutdown(shutdown)
        .run(start)
        .await
        .context("registry update")?;

    log::info!("{summary}");
    Ok(summary)
}

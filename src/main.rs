use clap::Parser;
use erc_contract_indexer::{run, Settings};
use tokio_util::sync::CancellationToken;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    let mut settings = Settings::build(args.config_path.as_deref())?;
    if args.detection_only {
        settings.detection_only = true;
    }

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("interrupt received, stopping after the current page");
                shutdown.cancel();
            }
        }
    });

    run(settings, shutdown).await?;
    Ok(())
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Config file, `ERC_INDEXER_CONFIG` when omitted. `ERC_INDEXER__*`
    /// environment variables override its values.
    #[clap(short, long)]
    pub config_path: Option<PathBuf>,

    /// Classify contracts without writing registries or the next pointer.
    #[clap(long)]
    pub detection_only: bool,
}

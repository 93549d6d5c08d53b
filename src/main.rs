use std::path::PathBuf;
use std::sync::Arc;

use assay_core::{AssignmentLedger, ResourceRegistry, ServerConfig};
use assay_transport::AssayServer;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Balanced trial-assignment service for classroom unknown-metal labs.
#[derive(Debug, Parser)]
#[command(name = "assay", version)]
struct Args {
    /// TOML config file; environment variables override its values.
    #[arg(short, long, env = "ASSAY_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref())?;

    let registry = ResourceRegistry::load(&config.catalog_path())?;
    let ledger = Arc::new(AssignmentLedger::bootstrap(&config, registry)?);
    let server = AssayServer::from_config(&config, ledger)?;

    tracing::info!(threads = config.threads, state_dir = %config.state_dir.display(), "starting runtime");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.threads)
        .enable_all()
        .build()?;

    runtime.block_on(server.start())
}

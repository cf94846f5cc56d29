mod cli;
mod clipboard;
mod hub;
mod source;
mod sync;

use std::time::Duration;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = sync::SyncConfig {
        url: cli.url,
        device: cli.device,
        restore_policy: cli.restore_policy,
        restore_after: Duration::from_secs(cli.restore_after),
    };

    if let Err(e) = sync::run(config).await {
        tracing::error!(error = %e, "sync failed");
        eprintln!("clipsyncd: {e}");
        std::process::exit(1);
    }
}

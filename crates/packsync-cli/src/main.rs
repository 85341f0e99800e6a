//! packsync CLI

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use packsync_cli::cmd;
use packsync_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise show warnings unless asked to be quiet
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.quiet { "error" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync {
            pack_url,
            root,
            side,
            recheck,
            jobs,
            timeout,
            enable,
            disable,
        } => {
            let options = packsync_cli::ops::SyncOptions {
                pack_url,
                root,
                side,
                recheck,
                jobs,
                timeout: Duration::from_secs(timeout),
                enable,
                disable,
            };
            cmd::sync::sync(options, cli.quiet).await
        }
        Commands::Hash { files, format } => cmd::hash::hash(&files, format).await,
        Commands::Status { root } => cmd::status::status(&root).await,
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}

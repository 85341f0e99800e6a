//! Sync command

use anyhow::{Context, Result, bail};
use packsync_core::HttpSource;
use packsync_schema::Platform;

use crate::ops::{self, SyncOptions};

/// Install or update the pack described by `options`.
pub async fn sync(options: SyncOptions, quiet: bool) -> Result<()> {
    let platform = Platform::detect();
    if !platform.is_known() {
        tracing::warn!("Couldn't determine platform, platform filtering is disabled");
    }

    tokio::fs::create_dir_all(&options.root)
        .await
        .with_context(|| format!("Failed to create {}", options.root.display()))?;

    let source =
        HttpSource::with_timeout(options.timeout).context("Failed to build HTTP client")?;
    let report = ops::sync(&options, &source, platform).await?;
    report.print(quiet);

    if !report.succeeded() {
        bail!("{} file(s) failed to sync", report.failures.len());
    }
    Ok(())
}

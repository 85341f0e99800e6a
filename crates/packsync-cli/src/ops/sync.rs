//! The `sync` operation: catalog in, reconciled installation out.

use anyhow::{Context, Result, bail};
use futures::stream::{self, StreamExt};
use packsync_core::catalog;
use packsync_core::io::{fs as pfs, source};
use packsync_core::manifest;
use packsync_core::{ContentSource, ReconciliationTask};
use packsync_schema::{InstallManifest, Platform, Side};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::report::{Failure, OptionalNotice, SyncReport};

/// Everything `sync` needs to know from the command line.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub pack_url: String,
    pub root: PathBuf,
    pub side: Side,
    pub recheck: bool,
    pub jobs: usize,
    /// Per-request limit for the HTTP source.
    pub timeout: Duration,
    pub enable: Vec<String>,
    pub disable: Vec<String>,
}

/// Reconcile the installation at `options.root` with the pack.
///
/// Per-file failures do not abort the run; they end up in the report and
/// keep the pack hash from being recorded. Metadata failures abort before
/// anything on disk is touched.
pub async fn sync(
    options: &SyncOptions,
    source: &dyn ContentSource,
    platform: Platform,
) -> Result<SyncReport> {
    let root = std::path::absolute(&options.root)
        .with_context(|| format!("Invalid root {}", options.root.display()))?;
    let root = root.as_path();
    let jobs = options.jobs.max(1);
    let manifest_path = manifest::manifest_path(root);
    let mut manifest = manifest::load(&manifest_path).await?;

    // 1. Pack file
    let pack_url = source::parse_location(&options.pack_url)?;
    let pack = catalog::load_pack(source, pack_url)
        .await
        .context("Failed to load pack file")?;

    if !options.recheck
        && manifest.pack_file_hash.as_ref() == Some(&pack.hash)
        && manifest.cached_side == Some(options.side)
        && !any_cached_file_missing(&manifest).await
    {
        tracing::debug!("Pack hash unchanged, nothing to do");
        return Ok(SyncReport::up_to_date());
    }

    // 2. Index
    let (catalog, index_hash) = catalog::load_index(source, &pack)
        .await
        .context("Failed to load index")?;
    let catalog = Arc::new(catalog);

    // 3. Tasks
    let side_changed = manifest.cached_side.is_some_and(|s| s != options.side);
    if side_changed {
        tracing::info!("Side changed to {}, re-checking every file", options.side);
    }
    let mut tasks = ReconciliationTask::from_catalog(&catalog, options.side, platform);
    for task in &mut tasks {
        let prior = manifest.cached_files.get(task.key()).cloned();
        let location_missing = match prior.as_ref().and_then(|r| r.cached_location.as_ref()) {
            Some(location) => !tokio::fs::try_exists(location).await.unwrap_or(false),
            None => false,
        };
        if options.recheck || side_changed || location_missing {
            task.invalidate();
        }
        task.attach_record(prior);
    }

    // 4. Metadata
    let tasks: Vec<ReconciliationTask> = stream::iter(tasks)
        .map(|mut task| async move {
            task.fetch_metadata(source).await;
            task
        })
        .buffered(jobs)
        .collect()
        .await;

    let failed: Vec<Failure> = tasks.iter().filter_map(Failure::from_task).collect();
    if !failed.is_empty() {
        let lines: Vec<String> = failed
            .iter()
            .map(|f| format!("  {}: {}", f.name, f.message))
            .collect();
        bail!(
            "Failed to fetch metadata for {} file(s):\n{}",
            failed.len(),
            lines.join("\n")
        );
    }

    // 5. Options
    let mut report = SyncReport::default();
    let mut tasks = tasks;
    report.unmatched_options = apply_selections(&mut tasks, &options.enable, &options.disable);
    report.new_optional = tasks
        .iter()
        .filter(|t| t.is_new_optional())
        .map(|t| OptionalNotice {
            name: t.name().to_string(),
            description: t.option_description().map(str::to_string),
            enabled: t.option_value(),
        })
        .collect();

    // 6. Revalidate and download
    let tasks: Vec<ReconciliationTask> = stream::iter(tasks)
        .map(|mut task| async move {
            task.revalidate_existing(root).await;
            task.download(root, source).await;
            task
        })
        .buffered(jobs)
        .collect()
        .await;

    // 7. Stale files
    let listed: HashSet<&str> = tasks.iter().map(ReconciliationTask::key).collect();
    let claimed: HashSet<&Path> = tasks
        .iter()
        .filter_map(|t| t.record().cached_location.as_deref())
        .collect();
    let stale: Vec<String> = manifest
        .cached_files
        .keys()
        .filter(|key| !listed.contains(key.as_str()))
        .cloned()
        .collect();
    for key in stale {
        if let Some(location) = manifest
            .cached_files
            .remove(&key)
            .and_then(|r| r.cached_location)
            .filter(|location| !claimed.contains(location.as_path()))
        {
            report.stale_removed += usize::from(remove_stale(&key, &location));
        }
    }

    // 8. Persist
    for task in &tasks {
        report.record(task);
    }
    let complete = report.succeeded();
    let mut records = BTreeMap::new();
    for task in tasks {
        if task.failed() {
            if let Some(prior) = manifest.cached_files.get(task.key()) {
                records.insert(task.key().to_string(), prior.clone());
            }
        } else {
            let (key, record) = task.into_record();
            records.insert(key, record);
        }
    }
    manifest.cached_files = records;
    if complete {
        manifest.pack_file_hash = Some(pack.hash);
        manifest.index_file_hash = Some(index_hash);
        manifest.cached_side = Some(options.side);
    }
    manifest::save(&manifest, &manifest_path)
        .await
        .context("Failed to save install manifest")?;

    Ok(report)
}

async fn any_cached_file_missing(manifest: &InstallManifest) -> bool {
    for location in manifest
        .cached_files
        .values()
        .filter_map(|r| r.cached_location.as_ref())
    {
        if !tokio::fs::try_exists(location).await.unwrap_or(false) {
            tracing::debug!("{} has gone missing", location.display());
            return true;
        }
    }
    false
}

/// Apply `--enable`/`--disable`, matching display names or index paths
/// case-insensitively. Returns the names that matched nothing.
fn apply_selections(
    tasks: &mut [ReconciliationTask],
    enable: &[String],
    disable: &[String],
) -> Vec<String> {
    let mut unmatched = Vec::new();
    for (names, value) in [(enable, true), (disable, false)] {
        for name in names {
            let mut matched = false;
            for task in tasks.iter_mut().filter(|t| t.is_optional()) {
                if task.name().eq_ignore_ascii_case(name) || task.key().eq_ignore_ascii_case(name) {
                    task.set_option_value(value);
                    matched = true;
                }
            }
            if !matched {
                unmatched.push(name.clone());
            }
        }
    }
    unmatched
}

fn remove_stale(key: &str, location: &Path) -> bool {
    match pfs::remove_if_exists(location) {
        Ok(removed) => {
            if removed {
                tracing::info!("Removed {} (no longer in pack)", location.display());
            }
            removed
        }
        Err(e) => {
            tracing::warn!("Failed to delete {} for {}: {}", location.display(), key, e);
            false
        }
    }
}

//! Per-file reconciliation.
//!
//! A [`ReconciliationTask`] brings one declared file in line with the
//! catalog. The caller drives it through a fixed sequence:
//!
//! ```text
//! attach_record ─> fetch_metadata ─> revalidate_existing ─> download
//!                                                             │
//!                                           decide ─┬─ skip ──┴─> delete previous copy
//!                                                   └─ proceed ─> fetch, verify, write
//! ```
//!
//! The first failure is kept in the task and turns every later step into a
//! no-op, so a batch of tasks can be run to completion and inspected
//! afterwards without any of them aborting the others.

mod decision;
mod error;
mod status;

pub use decision::{Applicability, Verdict, evaluate};
pub use error::TaskError;
pub use status::{CompletionStatus, SkipReason};

use packsync_schema::{CacheRecord, DeclaredFile, Hash, LinkedMetadata, PackPath, Platform, Side};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::io::source::{self, ContentSource, SourceError};
use crate::io::{fs, verify};

/// Reconciliation state for one declared file.
#[derive(Debug)]
pub struct ReconciliationTask {
    file: DeclaredFile,
    catalog: Arc<Catalog>,
    side: Side,
    platform: Platform,
    record: CacheRecord,
    error: Option<TaskError>,
    status: CompletionStatus,
    already_up_to_date: bool,
    metadata_required: bool,
    invalidated: bool,
    newly_optional: bool,
}

impl ReconciliationTask {
    pub fn new(file: DeclaredFile, catalog: Arc<Catalog>, side: Side, platform: Platform) -> Self {
        Self {
            file,
            catalog,
            side,
            platform,
            record: CacheRecord::default(),
            error: None,
            status: CompletionStatus::Incomplete,
            already_up_to_date: false,
            metadata_required: true,
            invalidated: false,
            newly_optional: true,
        }
    }

    /// One task per file of `catalog`, in index order.
    pub fn from_catalog(catalog: &Arc<Catalog>, side: Side, platform: Platform) -> Vec<Self> {
        catalog
            .files()
            .iter()
            .map(|file| Self::new(file.clone(), Arc::clone(catalog), side, platform))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Display name of the file.
    pub fn name(&self) -> &str {
        self.file.name()
    }

    /// Manifest key of the file (its index path).
    pub fn key(&self) -> &str {
        self.file.file.as_str()
    }

    pub fn record(&self) -> &CacheRecord {
        &self.record
    }

    /// Hand back the manifest key and the final record.
    pub fn into_record(self) -> (String, CacheRecord) {
        (self.file.file.as_str().to_string(), self.record)
    }

    pub fn completion_status(&self) -> CompletionStatus {
        self.status
    }

    pub fn already_up_to_date(&self) -> bool {
        self.already_up_to_date
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&TaskError> {
        self.error.as_ref()
    }

    /// The file's metadata declares it optional.
    pub fn is_optional(&self) -> bool {
        self.file.linked.as_ref().is_some_and(|l| l.option.optional)
    }

    /// Optional, and was not optional the last time it was installed.
    pub fn is_new_optional(&self) -> bool {
        self.is_optional() && self.newly_optional
    }

    pub fn option_description(&self) -> Option<&str> {
        self.file
            .linked
            .as_ref()
            .map(|l| l.option.description.as_str())
            .filter(|d| !d.is_empty())
    }

    pub fn option_value(&self) -> bool {
        self.record.option_value
    }

    /// Select or deselect an optional file.
    ///
    /// A changed selection makes the file eligible for work again.
    pub fn set_option_value(&mut self, value: bool) {
        if value != self.record.option_value {
            self.already_up_to_date = false;
        }
        self.record.option_value = value;
    }

    // ---------------------------------------------------------------------
    // Steps
    // ---------------------------------------------------------------------

    /// Ignore the cache: refetch metadata and re-verify the file.
    ///
    /// Undoes whatever [`attach_record`](Self::attach_record) concluded, so
    /// the two may be called in either order.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
        self.already_up_to_date = false;
        self.metadata_required = true;
        self.status = CompletionStatus::Incomplete;
    }

    /// Adopt the record from the previous run, or start a fresh one.
    pub fn attach_record(&mut self, prior: Option<CacheRecord>) {
        if self.error.is_some() {
            return;
        }
        let Some(prior) = prior else {
            self.record = CacheRecord::default();
            return;
        };
        self.record = prior;

        if !self.invalidated {
            match self.file.hash(&self.catalog.index) {
                Ok(current) if self.record.hash.as_ref() == Some(&current) => {
                    self.already_up_to_date = true;
                    self.status = CompletionStatus::AlreadyPresentCached;
                    if !self.file.metafile {
                        self.metadata_required = false;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let err = self.invalid_hash(e);
                    self.fail(err);
                    return;
                }
            }
        }

        if self.record.is_optional {
            self.metadata_required = true;
        }
    }

    /// Fetch and verify the metafile, then settle optionality.
    pub async fn fetch_metadata(&mut self, source: &dyn ContentSource) {
        if self.error.is_some() || !self.metadata_required {
            return;
        }
        if let Err(e) = self.try_fetch_metadata(source).await {
            self.fail(e);
            return;
        }

        if let Some(linked) = self.file.linked.as_ref().filter(|l| l.option.optional) {
            if self.record.is_optional {
                self.newly_optional = false;
            } else {
                self.record.option_value = linked.option.default;
            }
        }
        self.record.is_optional = self.is_optional();
        self.record.only_other_side = !self.correct_side();
    }

    async fn try_fetch_metadata(&mut self, source: &dyn ContentSource) -> Result<(), TaskError> {
        if !self.file.metafile {
            return Ok(());
        }

        let expected = self
            .file
            .hash(&self.catalog.index)
            .map_err(|e| self.invalid_hash(e))?;
        let fetch_err = |name: &str, source| TaskError::MetadataFetch {
            name: name.to_string(),
            source,
        };
        let url = source::resolve_relative(&self.catalog.base, &self.file.file)
            .map_err(|e| fetch_err(self.name(), e))?;

        tracing::debug!("Fetching metadata for {} from {}", self.name(), url);
        let (actual, bytes) = source::fetch_digested(source, &url, expected.format())
            .await
            .map_err(|e| fetch_err(self.name(), e))?;
        if actual != expected {
            return Err(TaskError::MetadataMismatch {
                name: self.name().to_string(),
                expected,
                actual,
            });
        }

        let parse_err = |name: &str, reason: String| TaskError::MetadataParse {
            name: name.to_string(),
            reason,
        };
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| parse_err(self.name(), e.to_string()))?;
        let linked =
            LinkedMetadata::from_toml(text).map_err(|e| parse_err(self.name(), e.to_string()))?;
        self.file.linked = Some(linked);
        Ok(())
    }

    /// Accept a file already on disk if it matches the expected hash.
    ///
    /// A missing or unreadable file just means there is work to do.
    pub async fn revalidate_existing(&mut self, root: &Path) {
        if self.error.is_some() || self.already_up_to_date {
            return;
        }
        if let Err(e) = self.try_revalidate(root).await {
            self.fail(e);
        }
    }

    async fn try_revalidate(&mut self, root: &Path) -> Result<(), TaskError> {
        let path = self.destination()?.rebase(root);
        let expected = self.content_hash()?;

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!("No usable copy of {} at {}: {}", self.name(), path.display(), e);
                return Ok(());
            }
        };
        let actual = match verify::digest_reader(file, expected.format()).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::debug!("Failed to read {}: {}", path.display(), e);
                return Ok(());
            }
        };

        if actual == expected {
            tracing::debug!("{} already present at {}", self.name(), path.display());
            self.record_success(path)?;
            self.already_up_to_date = true;
            self.status = CompletionStatus::AlreadyPresentValidated;
        }
        Ok(())
    }

    /// Decide on the file, then either remove it or make sure it is in place.
    pub async fn download(&mut self, root: &Path, source: &dyn ContentSource) {
        if self.error.is_some() {
            return;
        }

        match self.decide() {
            Verdict::Skip(reason) => {
                self.status = self.delete_and_skip(reason);
                return;
            }
            Verdict::Proceed(Some(status)) => self.status = status,
            Verdict::Proceed(None) => {}
        }

        if self.already_up_to_date {
            return;
        }
        if let Err(e) = self.try_download(root, source).await {
            self.fail(e);
        }
    }

    /// Run metadata, revalidation and download back to back.
    pub async fn run(&mut self, root: &Path, source: &dyn ContentSource) {
        self.fetch_metadata(source).await;
        self.revalidate_existing(root).await;
        self.download(root, source).await;
    }

    fn decide(&self) -> Verdict {
        let flags = Applicability {
            wrong_side: !self.correct_side(),
            wrong_platform: self
                .file
                .linked
                .as_ref()
                .is_some_and(|l| l.excludes_platform(self.platform)),
            disabled: self.record.is_optional && !self.record.option_value,
        };
        evaluate(self.side, self.platform, flags)
    }

    fn delete_and_skip(&mut self, reason: SkipReason) -> CompletionStatus {
        let Some(location) = self.record.cached_location.take() else {
            return reason.skipped();
        };
        match fs::remove_if_exists(&location) {
            Ok(true) => {
                tracing::info!("Deleted {} ({})", location.display(), reason.deleted().describe());
                reason.deleted()
            }
            Ok(false) => reason.skipped(),
            Err(e) => {
                tracing::warn!("Failed to delete {}: {}", location.display(), e);
                reason.skipped()
            }
        }
    }

    async fn try_download(
        &mut self,
        root: &Path,
        source: &dyn ContentSource,
    ) -> Result<(), TaskError> {
        let destination = self.destination()?;
        let path = destination.rebase(root);

        if self.file.preserve && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("Preserving existing {}", path.display());
            return Ok(());
        }

        let expected = self.content_hash()?;
        let url = self.download_url()?;

        tracing::debug!("Downloading {} from {}", self.name(), url);
        let (actual, bytes) = source::fetch_digested(source, &url, expected.format())
            .await
            .map_err(|e| TaskError::Download {
                name: self.name().to_string(),
                source: e,
            })?;

        if actual != expected {
            tracing::warn!("Invalid hash for {}", destination);
            tracing::warn!("Calculated: {}", actual);
            tracing::warn!("Expected:   {}", expected);
            tracing::warn!("SHA256 hash value: {}", verify::diagnostic_sha256(&bytes));
            return Err(TaskError::HashMismatch {
                name: self.name().to_string(),
                expected,
                actual,
            });
        }

        fs::write_atomic_async(path.clone(), bytes)
            .await
            .map_err(|e| TaskError::Write {
                path: path.clone(),
                source: e,
            })?;

        if let Some(previous) = self.record.cached_location.as_ref().filter(|p| **p != path) {
            match fs::remove_if_exists(previous) {
                Ok(true) => tracing::debug!("Removed previous copy {}", previous.display()),
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to delete {}: {}", previous.display(), e),
            }
        }

        self.record_success(path)?;
        if self.status != CompletionStatus::DownloadedIgnoringPlatformFilter {
            self.status = CompletionStatus::Downloaded;
        }
        tracing::info!("Downloaded {}", self.name());
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn fail(&mut self, err: TaskError) {
        tracing::debug!("{} failed: {}", self.name(), err);
        self.error.get_or_insert(err);
    }

    fn invalid_hash(&self, source: packsync_schema::HashError) -> TaskError {
        TaskError::InvalidHash {
            name: self.name().to_string(),
            source,
        }
    }

    fn correct_side(&self) -> bool {
        self.file
            .linked
            .as_ref()
            .is_none_or(|l| self.side.has_side(l.side))
    }

    /// Where the file lives, relative to the installation root.
    fn destination(&self) -> Result<PackPath, TaskError> {
        if let Some(alias) = &self.file.alias {
            return Ok(alias.clone());
        }
        match (&self.file.linked, self.file.metafile) {
            (Some(linked), true) => {
                self.file
                    .file
                    .with_file_name(&linked.filename)
                    .map_err(|e| TaskError::InvalidPath {
                        name: self.name().to_string(),
                        source: e,
                    })
            }
            (None, true) => Err(self.metadata_missing()),
            (_, false) => Ok(self.file.file.clone()),
        }
    }

    /// Expected digest of the content that ends up on disk.
    fn content_hash(&self) -> Result<Hash, TaskError> {
        let hash = match &self.file.linked {
            Some(linked) => linked.hash(),
            None if self.file.metafile => return Err(self.metadata_missing()),
            None => self.file.hash(&self.catalog.index),
        };
        hash.map_err(|e| self.invalid_hash(e))
    }

    fn download_url(&self) -> Result<Url, TaskError> {
        let download_err = |source| TaskError::Download {
            name: self.name().to_string(),
            source,
        };
        match &self.file.linked {
            Some(linked) => Url::parse(&linked.download.url).map_err(|e| {
                download_err(SourceError::InvalidLocation {
                    location: linked.download.url.clone(),
                    reason: e.to_string(),
                })
            }),
            None => source::resolve_relative(&self.catalog.base, &self.file.file)
                .map_err(download_err),
        }
    }

    fn metadata_missing(&self) -> TaskError {
        TaskError::MetadataParse {
            name: self.name().to_string(),
            reason: "metadata has not been fetched".to_string(),
        }
    }

    /// Remember what is now on disk. Nothing is written to the record unless
    /// every value could be computed.
    fn record_success(&mut self, location: PathBuf) -> Result<(), TaskError> {
        let hash = self
            .file
            .hash(&self.catalog.index)
            .map_err(|e| self.invalid_hash(e))?;
        let linked_hash = self
            .file
            .linked
            .as_ref()
            .map(LinkedMetadata::hash)
            .transpose()
            .map_err(|e| self.invalid_hash(e))?;

        self.record.hash = Some(hash);
        self.record.is_optional = self.is_optional();
        self.record.cached_location = Some(location);
        if linked_hash.is_some() {
            self.record.linked_file_hash = linked_hash;
        }
        Ok(())
    }
}

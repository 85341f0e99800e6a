//! Core library for packsync.
//!
//! - [`io::verify`]: streaming digests for every supported [`HashFormat`](packsync_schema::HashFormat)
//! - [`io::source`]: the [`ContentSource`] seam over HTTP and local files
//! - [`catalog`]: fetching and verifying the pack file and index
//! - [`manifest`]: loading and atomically saving the install manifest
//! - [`task`]: the per-file reconciliation engine

pub mod catalog;
pub mod io;
pub mod manifest;
pub mod task;

pub use catalog::Catalog;
pub use io::source::{ContentSource, HttpSource, SourceError};
pub use task::{CompletionStatus, ReconciliationTask, TaskError};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("packsync/", env!("CARGO_PKG_VERSION"));

use packsync_schema::{Hash, HashError, PathError};
use std::path::PathBuf;
use thiserror::Error;

use crate::io::source::SourceError;

/// Why a reconciliation task stopped.
///
/// Once a task records one of these, none of its later steps run.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Invalid hash for {name}: {source}")]
    InvalidHash {
        name: String,
        #[source]
        source: HashError,
    },

    #[error("Failed to fetch metadata for {name}: {source}")]
    MetadataFetch {
        name: String,
        #[source]
        source: SourceError,
    },

    #[error("Failed to parse metadata for {name}: {reason}")]
    MetadataParse { name: String, reason: String },

    #[error("Invalid hash for metadata of {name}: expected {expected}, got {actual}")]
    MetadataMismatch {
        name: String,
        expected: Hash,
        actual: Hash,
    },

    #[error("Hash mismatch for {name}: expected {expected}, got {actual}")]
    HashMismatch {
        name: String,
        expected: Hash,
        actual: Hash,
    },

    #[error("Failed to download {name}: {source}")]
    Download {
        name: String,
        #[source]
        source: SourceError,
    },

    #[error("Invalid destination for {name}: {source}")]
    InvalidPath {
        name: String,
        #[source]
        source: PathError,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TaskError {
    /// Short machine-friendly category, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidHash { .. } => "invalid-hash",
            Self::MetadataFetch { .. }
            | Self::MetadataParse { .. }
            | Self::MetadataMismatch { .. } => "metadata",
            Self::HashMismatch { .. } => "integrity",
            Self::Download { .. } => "download",
            Self::InvalidPath { .. } => "path",
            Self::Write { .. } => "write",
        }
    }

    /// Failed while fetching or reading metadata.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            Self::MetadataFetch { .. } | Self::MetadataParse { .. } | Self::MetadataMismatch { .. }
        )
    }
}

//! Shared types and wire formats for packsync.
//!
//! Everything in this crate is plain data: the remote catalog (pack file,
//! index, metafiles), the locally persisted install manifest, and the small
//! classification enums ([`Side`], [`Platform`]) the reconciliation engine
//! composes into its decisions. No I/O happens here.

pub mod catalog;
pub mod hash;
pub mod path;
pub mod platform;
pub mod record;
pub mod side;

// Re-exports
pub use catalog::{DeclaredFile, DownloadSpec, Index, IndexRef, LinkedMetadata, OptionSpec, PackFile};
pub use hash::{Hash, HashError, HashFormat};
pub use path::{PackPath, PathError};
pub use platform::Platform;
pub use record::{CacheRecord, InstallManifest};
pub use side::Side;

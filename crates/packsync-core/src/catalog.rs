//! Fetching and verifying the remote catalog.
//!
//! The pack file is trusted as given (its SHA-256 is recorded so an unchanged
//! pack can be skipped next time). The index is only accepted if it matches
//! the hash the pack file declares for it.

use packsync_schema::{DeclaredFile, Hash, HashError, HashFormat, Index, PackFile};
use reqwest::Url;
use thiserror::Error;

use crate::io::source::{self, ContentSource, SourceError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to parse {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{location} is not valid UTF-8")]
    Encoding { location: String },

    #[error("Invalid hash in pack file: {0}")]
    Hash(#[from] HashError),

    #[error("Index hash mismatch: expected {expected}, got {actual}")]
    IndexMismatch { expected: Hash, actual: Hash },
}

/// A pack file together with where it came from and its digest.
#[derive(Debug, Clone)]
pub struct LoadedPack {
    pub pack: PackFile,
    pub url: Url,
    /// SHA-256 of the pack file bytes.
    pub hash: Hash,
}

/// The verified index plus the URL its relative paths resolve against.
///
/// Shared read-only by every task of a run.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub index: Index,
    pub base: Url,
}

impl Catalog {
    pub fn new(index: Index, base: Url) -> Self {
        Self { index, base }
    }

    /// Declared files in index order.
    pub fn files(&self) -> &[DeclaredFile] {
        &self.index.files
    }
}

fn utf8(location: &Url, bytes: &[u8]) -> Result<String, CatalogError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| CatalogError::Encoding {
        location: location.to_string(),
    })
}

/// Fetch and parse the pack file at `url`.
///
/// # Errors
///
/// Returns a [`CatalogError`] if it cannot be fetched or parsed.
pub async fn load_pack(source: &dyn ContentSource, url: Url) -> Result<LoadedPack, CatalogError> {
    let (hash, bytes) = source::fetch_digested(source, &url, HashFormat::Sha256).await?;
    let text = utf8(&url, &bytes)?;
    let pack = PackFile::from_toml(&text).map_err(|e| CatalogError::Parse {
        location: url.to_string(),
        source: e,
    })?;
    tracing::debug!("Loaded pack '{}' from {}", pack.name, url);
    Ok(LoadedPack { pack, url, hash })
}

/// Fetch the index named by `pack`, verify it, and parse it.
///
/// Returns the catalog and the index digest.
///
/// # Errors
///
/// Returns a [`CatalogError`] if the index cannot be fetched, does not match
/// the declared hash, or cannot be parsed.
pub async fn load_index(
    source: &dyn ContentSource,
    pack: &LoadedPack,
) -> Result<(Catalog, Hash), CatalogError> {
    let expected = pack.pack.index.hash()?;
    let url = source::resolve_relative(&pack.url, &pack.pack.index.file)?;

    let (actual, bytes) = source::fetch_digested(source, &url, expected.format()).await?;
    if actual != expected {
        return Err(CatalogError::IndexMismatch { expected, actual });
    }

    let text = utf8(&url, &bytes)?;
    let index = Index::from_toml(&text).map_err(|e| CatalogError::Parse {
        location: url.to_string(),
        source: e,
    })?;
    tracing::debug!("Index lists {} files", index.files.len());
    Ok((Catalog::new(index, url), actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::verify::digest_bytes;

    fn write(dir: &std::path::Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn pack_toml(index_hash: &str) -> String {
        format!(
            r#"
name = "Test"
[index]
file = "index.toml"
hash-format = "sha256"
hash = "{index_hash}"
"#
        )
    }

    const INDEX: &str = r#"
hash-format = "sha256"
[[files]]
file = "config/a.txt"
hash = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
"#;

    #[tokio::test]
    async fn loads_pack_and_verified_index() {
        let dir = tempfile::tempdir().unwrap();
        let index_hash = digest_bytes(HashFormat::Sha256, INDEX.as_bytes());
        write(dir.path(), "index.toml", INDEX);
        write(dir.path(), "pack.toml", &pack_toml(index_hash.as_str()));

        let source = crate::HttpSource::new().unwrap();
        let url = Url::from_file_path(dir.path().join("pack.toml")).unwrap();
        let pack = load_pack(&source, url).await.unwrap();
        assert_eq!(pack.pack.name, "Test");
        assert_eq!(pack.hash.format(), HashFormat::Sha256);

        let (catalog, hash) = load_index(&source, &pack).await.unwrap();
        assert_eq!(hash, index_hash);
        assert_eq!(catalog.files().len(), 1);
        assert!(catalog.base.as_str().ends_with("/index.toml"));
    }

    #[tokio::test]
    async fn rejects_tampered_index() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.toml", INDEX);
        write(
            dir.path(),
            "pack.toml",
            &pack_toml("0000000000000000000000000000000000000000000000000000000000000000"),
        );

        let source = crate::HttpSource::new().unwrap();
        let url = Url::from_file_path(dir.path().join("pack.toml")).unwrap();
        let pack = load_pack(&source, url).await.unwrap();
        let err = load_index(&source, &pack).await.unwrap_err();
        assert!(matches!(err, CatalogError::IndexMismatch { .. }));
    }
}

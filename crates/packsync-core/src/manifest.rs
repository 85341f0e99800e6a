//! Loading and saving the install manifest (`packsync.json`).

use anyhow::{Context, Result};
use packsync_schema::InstallManifest;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File name of the manifest inside the installation root.
pub const MANIFEST_FILE: &str = "packsync.json";

/// Manifest location for an installation rooted at `root`.
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Load the manifest at `path`.
///
/// A missing file yields an empty manifest, so a first install is handled
/// the same as any later one.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load(path: &Path) -> Result<InstallManifest> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Ok(InstallManifest::default());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let manifest: InstallManifest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(manifest)
}

/// Atomically persist `manifest` to `path`.
///
/// The JSON is first written to a temporary file and then renamed so a
/// crash never leaves a half-written manifest behind.
///
/// # Errors
///
/// Returns an error if serialization, writing, or the rename fails.
pub async fn save(manifest: &InstallManifest, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(manifest)?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content)
        .await
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use packsync_schema::{CacheRecord, Side};

    #[tokio::test]
    async fn missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = load(&manifest_path(dir.path())).await.unwrap();
        assert_eq!(manifest, InstallManifest::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = manifest_path(dir.path());

        let mut manifest = InstallManifest {
            cached_side: Some(Side::Server),
            ..InstallManifest::default()
        };
        manifest.cached_files.insert(
            "config/a.txt".to_string(),
            CacheRecord {
                cached_location: Some(dir.path().join("config/a.txt")),
                ..CacheRecord::default()
            },
        );

        save(&manifest, &path).await.unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load(&path).await.unwrap(), manifest);
    }

    #[tokio::test]
    async fn corrupt_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = manifest_path(dir.path());
        std::fs::write(&path, "{not json").unwrap();
        assert!(load(&path).await.is_err());
    }
}

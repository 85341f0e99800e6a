//! The remote catalog: pack file, index, and per-file metafiles.
//!
//! All three are TOML documents. Keys packsync does not understand are kept in
//! `extra` tables so the documents survive a load/store round trip.
//!
//! ```text
//! pack.toml ──[index]──> index.toml ──[[files]]──> mods/foo.pw.toml ──[download]──> foo.jar
//! ```

use serde::{Deserialize, Serialize};

use crate::hash::{Hash, HashError, HashFormat};
use crate::path::PackPath;
use crate::platform::Platform;
use crate::side::Side;

/// Top-level pack descriptor (`pack.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackFile {
    /// Human-readable pack name.
    pub name: String,
    /// Pack version string, if declared.
    #[serde(default)]
    pub version: Option<String>,
    /// Where the index lives and how to verify it.
    pub index: IndexRef,
    /// Keys not interpreted by packsync.
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// The `[index]` section of a pack file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexRef {
    /// Index location relative to the pack file.
    pub file: PackPath,
    /// Algorithm for `hash`.
    pub hash_format: String,
    /// Expected digest of the index file.
    pub hash: String,
}

/// The file index (`index.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Index {
    /// Default algorithm for entries that do not name their own.
    pub hash_format: String,
    /// Every file the installation should contain.
    #[serde(default)]
    pub files: Vec<DeclaredFile>,
    /// Keys not interpreted by packsync.
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// One `[[files]]` entry of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeclaredFile {
    /// Path of the entry relative to the index (and, unless it is a metafile,
    /// its destination relative to the pack root).
    pub file: PackPath,
    /// Expected digest of the entry as listed in the index.
    pub hash: String,
    /// Algorithm for `hash`; falls back to the index default.
    #[serde(default)]
    pub hash_format: Option<String>,
    /// Alternative destination, overriding the derived one.
    #[serde(default)]
    pub alias: Option<PackPath>,
    /// The entry is a metafile describing where the real file comes from.
    #[serde(default)]
    pub metafile: bool,
    /// Never overwrite a file that already exists at the destination.
    #[serde(default)]
    pub preserve: bool,
    /// Populated once the metafile has been fetched.
    #[serde(skip)]
    pub linked: Option<LinkedMetadata>,
}

impl PackFile {
    /// Parse a pack file from TOML.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the document is malformed or misses required keys.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

impl IndexRef {
    /// Expected digest of the index.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the format is unknown or the value malformed.
    pub fn hash(&self) -> Result<Hash, HashError> {
        Hash::parse_named(&self.hash_format, &self.hash)
    }
}

impl Index {
    /// Parse an index from TOML.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the document is malformed or misses required keys.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

impl DeclaredFile {
    /// Algorithm for this entry's index hash.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::UnknownFormat`] if neither the entry nor the index
    /// names a known algorithm.
    pub fn hash_format(&self, index: &Index) -> Result<HashFormat, HashError> {
        self.hash_format
            .as_deref()
            .unwrap_or(&index.hash_format)
            .parse()
    }

    /// Expected digest of this entry as listed in the index.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the format is unknown or the value malformed.
    pub fn hash(&self, index: &Index) -> Result<Hash, HashError> {
        Hash::parse(self.hash_format(index)?, &self.hash)
    }

    /// Display name: the metafile's `name` once fetched, otherwise the file name.
    pub fn name(&self) -> &str {
        self.linked
            .as_ref()
            .map_or_else(|| self.file.file_name(), |l| l.name.as_str())
    }
}

/// Contents of a metafile (`*.pw.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LinkedMetadata {
    /// Display name.
    pub name: String,
    /// File name of the real file, placed next to the metafile.
    pub filename: String,
    /// Which installations need the file.
    #[serde(default)]
    pub side: Side,
    /// Where to fetch the real file and how to verify it.
    pub download: DownloadSpec,
    /// Optionality of the file.
    #[serde(default)]
    pub option: OptionSpec,
    /// Keys not interpreted by packsync.
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// The `[download]` section of a metafile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DownloadSpec {
    /// Absolute URL of the real file.
    pub url: String,
    /// Algorithm for `hash`.
    pub hash_format: String,
    /// Expected digest of the real file.
    pub hash: String,
    /// Client platforms that must not receive the file.
    #[serde(default)]
    pub disabled_client_platforms: Vec<Platform>,
}

/// The `[option]` section of a metafile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OptionSpec {
    /// The user may choose whether to install the file.
    #[serde(default)]
    pub optional: bool,
    /// Initial selection when the file first becomes optional.
    #[serde(default)]
    pub default: bool,
    /// Shown to the user when asking.
    #[serde(default)]
    pub description: String,
}

impl LinkedMetadata {
    /// Parse a metafile from TOML.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the document is malformed or misses required keys.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Algorithm for the real file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::UnknownFormat`] for an unrecognized algorithm name.
    pub fn hash_format(&self) -> Result<HashFormat, HashError> {
        self.download.hash_format.parse()
    }

    /// Expected digest of the real file.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the format is unknown or the value malformed.
    pub fn hash(&self) -> Result<Hash, HashError> {
        Hash::parse(self.hash_format()?, &self.download.hash)
    }

    /// Returns `true` if `platform` is listed as excluded.
    pub fn excludes_platform(&self, platform: Platform) -> bool {
        self.download.disabled_client_platforms.contains(&platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
hash-format = "sha256"

[[files]]
file = "config/options.txt"
hash = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
preserve = true

[[files]]
file = "mods/sodium.pw.toml"
hash = "0000000000000000000000000000000000000000"
hash-format = "sha1"
metafile = true
"#;

    const METAFILE: &str = r#"
name = "Sodium"
filename = "sodium-0.5.8.jar"
side = "client"
loader-dependent = true

[download]
url = "https://cdn.example.com/sodium-0.5.8.jar"
hash-format = "sha512"
hash = "00"
disabled-client-platforms = ["macos"]

[option]
optional = true
description = "Rendering optimizations"
"#;

    #[test]
    fn parses_index_with_defaults() {
        let index = Index::from_toml(INDEX).unwrap();
        assert_eq!(index.files.len(), 2);

        let options = &index.files[0];
        assert!(options.preserve);
        assert!(!options.metafile);
        assert_eq!(options.hash_format(&index).unwrap(), HashFormat::Sha256);
        assert_eq!(options.name(), "options.txt");

        let sodium = &index.files[1];
        assert!(sodium.metafile);
        assert_eq!(sodium.hash_format(&index).unwrap(), HashFormat::Sha1);
        assert!(sodium.linked.is_none());
    }

    #[test]
    fn parses_metafile_and_keeps_unknown_keys() {
        let meta = LinkedMetadata::from_toml(METAFILE).unwrap();
        assert_eq!(meta.side, Side::Client);
        assert!(meta.option.optional);
        assert!(!meta.option.default);
        assert!(meta.excludes_platform(Platform::Macos));
        assert!(!meta.excludes_platform(Platform::Linux));
        assert!(meta.extra.contains_key("loader-dependent"));
        // "00" is not a valid sha512 digest
        assert!(meta.hash().is_err());
    }

    #[test]
    fn metafile_side_defaults_to_both() {
        let meta = LinkedMetadata::from_toml(
            r#"
name = "Lib"
filename = "lib.jar"
[download]
url = "https://example.com/lib.jar"
hash-format = "sha1"
hash = "da39a3ee5e6b4b0d3255bfef95601890afd80709"
"#,
        )
        .unwrap();
        assert_eq!(meta.side, Side::Both);
        assert_eq!(meta.option, OptionSpec::default());
        assert!(meta.hash().is_ok());
    }

    #[test]
    fn unknown_index_format_surfaces_lazily() {
        let index = Index::from_toml(
            r#"
hash-format = "crc32"
[[files]]
file = "a.txt"
hash = "00"
"#,
        )
        .unwrap();
        assert!(matches!(
            index.files[0].hash(&index),
            Err(HashError::UnknownFormat(_))
        ));
    }

    #[test]
    fn declared_name_prefers_linked_metadata() {
        let mut index = Index::from_toml(INDEX).unwrap();
        let sodium = &mut index.files[1];
        sodium.linked = Some(LinkedMetadata::from_toml(METAFILE).unwrap());
        assert_eq!(sodium.name(), "Sodium");
    }

    #[test]
    fn pack_file_round_trips_extra_keys() {
        let pack = PackFile::from_toml(
            r#"
name = "Test Pack"
pack-format = "packwiz:1.1.0"

[index]
file = "index.toml"
hash-format = "sha256"
hash = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"

[versions]
minecraft = "1.20.1"
"#,
        )
        .unwrap();
        assert!(pack.index.hash().is_ok());
        let out = toml::to_string(&pack).unwrap();
        assert!(out.contains("pack-format"));
        assert!(out.contains("minecraft"));
    }
}

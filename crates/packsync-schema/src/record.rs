//! Locally persisted install state (`packsync.json`).
//!
//! The manifest remembers, per declared file, what was last verified on disk
//! so the next run can skip work. Fields unknown to this version are kept in
//! `extra` and written back unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::hash::Hash;
use crate::side::Side;

/// What packsync believes is installed for one declared file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Index hash of the entry when it was last verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
    /// Hash of the linked file when it was last verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_file_hash: Option<Hash>,
    /// Absolute path of the file packsync is responsible for, if one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_location: Option<PathBuf>,
    /// The file was optional when last seen.
    #[serde(default)]
    pub is_optional: bool,
    /// Selected inclusion for an optional file.
    #[serde(default = "default_option_value")]
    pub option_value: bool,
    /// The file exists in the pack but only for the other side.
    #[serde(default)]
    pub only_other_side: bool,
    /// Fields not interpreted by packsync.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_option_value() -> bool {
    true
}

impl Default for CacheRecord {
    fn default() -> Self {
        Self {
            hash: None,
            linked_file_hash: None,
            cached_location: None,
            is_optional: false,
            option_value: true,
            only_other_side: false,
            extra: serde_json::Map::new(),
        }
    }
}

/// The whole install manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InstallManifest {
    /// Hash of the pack file at the last complete run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_file_hash: Option<Hash>,
    /// Hash of the index at the last complete run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_file_hash: Option<Hash>,
    /// Side the pack was last installed as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_side: Option<Side>,
    /// Records keyed by the declared file's index path.
    #[serde(default)]
    pub cached_files: BTreeMap<String, CacheRecord>,
    /// Fields not interpreted by packsync.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashFormat;

    #[test]
    fn missing_option_value_defaults_to_true() {
        let record: CacheRecord = serde_json::from_str("{}").unwrap();
        assert!(record.option_value);
        assert_eq!(record, CacheRecord::default());
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let json = r#"{
            "packFileHash": {"type": "sha256", "value": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"},
            "cachedSide": "client",
            "installerVersion": 7,
            "cachedFiles": {
                "mods/a.pw.toml": {
                    "hash": {"type": "sha1", "value": "da39a3ee5e6b4b0d3255bfef95601890afd80709"},
                    "cachedLocation": "/srv/pack/mods/a.jar",
                    "isOptional": true,
                    "optionValue": false,
                    "pinned": "yes"
                }
            }
        }"#;

        let manifest: InstallManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.cached_side, Some(Side::Client));
        assert_eq!(
            manifest.pack_file_hash.as_ref().unwrap().format(),
            HashFormat::Sha256
        );
        let record = &manifest.cached_files["mods/a.pw.toml"];
        assert!(record.is_optional);
        assert!(!record.option_value);
        assert_eq!(record.extra["pinned"], "yes");

        let out = serde_json::to_value(&manifest).unwrap();
        assert_eq!(out["installerVersion"], 7);
        assert_eq!(out["cachedFiles"]["mods/a.pw.toml"]["pinned"], "yes");

        let again: InstallManifest = serde_json::from_value(out).unwrap();
        assert_eq!(again, manifest);
    }
}

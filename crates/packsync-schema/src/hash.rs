//! Digest formats and normalized hash values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while interpreting hash formats and digest values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The hash format name is not one packsync knows how to compute.
    #[error("Unknown hash format: {0}")]
    UnknownFormat(String),

    /// The digest string does not have the shape its format requires.
    #[error("Invalid {format} digest '{value}': {reason}")]
    InvalidValue {
        /// Format the value was parsed as.
        format: HashFormat,
        /// Offending input.
        value: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// A named content digest algorithm.
///
/// Catalogs name the algorithm per file (or once for the whole index), so the
/// engine never assumes a single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFormat {
    /// SHA-1, hex encoded.
    Sha1,
    /// SHA-256, hex encoded.
    Sha256,
    /// SHA-512, hex encoded.
    Sha512,
    /// MD5, hex encoded.
    Md5,
    /// BLAKE3, hex encoded.
    Blake3,
    /// CurseForge fingerprint: 32-bit `MurmurHash2` over whitespace-stripped bytes, decimal.
    Murmur2,
}

impl HashFormat {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Md5 => "md5",
            Self::Blake3 => "blake3",
            Self::Murmur2 => "murmur2",
        }
    }

    /// Number of hex characters in a digest, or `None` for decimal formats.
    pub fn hex_len(&self) -> Option<usize> {
        match self {
            Self::Sha1 => Some(40),
            Self::Sha256 | Self::Blake3 => Some(64),
            Self::Sha512 => Some(128),
            Self::Md5 => Some(32),
            Self::Murmur2 => None,
        }
    }
}

impl std::fmt::Display for HashFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HashFormat {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            "md5" => Ok(Self::Md5),
            "blake3" => Ok(Self::Blake3),
            "murmur2" => Ok(Self::Murmur2),
            _ => Err(HashError::UnknownFormat(s.to_string())),
        }
    }
}

/// A digest value tagged with the algorithm that produced it.
///
/// Values are normalized on construction (lowercase hex, canonical decimal),
/// so two `Hash`es of the same format compare equal iff the digests match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHash")]
pub struct Hash {
    #[serde(rename = "type")]
    format: HashFormat,
    value: String,
}

#[derive(Deserialize)]
struct RawHash {
    #[serde(rename = "type")]
    format: HashFormat,
    value: String,
}

impl TryFrom<RawHash> for Hash {
    type Error = HashError;

    fn try_from(raw: RawHash) -> Result<Self, Self::Error> {
        Self::parse(raw.format, &raw.value)
    }
}

impl Hash {
    /// Parse and normalize a digest string for `format`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidValue`] if the value has the wrong length,
    /// contains non-hex characters, or is not a 32-bit decimal for `murmur2`.
    pub fn parse(format: HashFormat, value: &str) -> Result<Self, HashError> {
        let trimmed = value.trim();
        let invalid = |reason: String| HashError::InvalidValue {
            format,
            value: value.to_string(),
            reason,
        };

        let normalized = if let Some(len) = format.hex_len() {
            if trimmed.len() != len {
                return Err(invalid(format!(
                    "expected {len} hex characters, got {}",
                    trimmed.len()
                )));
            }
            if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid("contains non-hex characters".to_string()));
            }
            trimmed.to_lowercase()
        } else {
            let parsed: u32 = trimmed
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
            parsed.to_string()
        };

        Ok(Self {
            format,
            value: normalized,
        })
    }

    /// Parse with a format given by name.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::UnknownFormat`] for an unrecognized name, or any
    /// error from [`Hash::parse`].
    pub fn parse_named(format: &str, value: &str) -> Result<Self, HashError> {
        Self::parse(format.parse()?, value)
    }

    /// Build a hash from raw digest bytes, hex encoding them.
    ///
    /// # Panics
    ///
    /// Panics if `format` is [`HashFormat::Murmur2`], which is not a byte digest.
    pub fn from_digest_bytes(format: HashFormat, bytes: &[u8]) -> Self {
        assert!(format.hex_len().is_some(), "{format} is not a byte digest");
        Self {
            format,
            value: hex::encode(bytes),
        }
    }

    /// Build a `murmur2` hash from its numeric value.
    pub fn from_murmur2(value: u32) -> Self {
        Self {
            format: HashFormat::Murmur2,
            value: value.to_string(),
        }
    }

    /// The algorithm this digest belongs to.
    pub fn format(&self) -> HashFormat {
        self.format
    }

    /// The normalized digest string.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.format, self.value)
    }
}

//! Streaming content verification.
//!
//! Bytes are read once, fed to the digest for the requested format, and then
//! either dropped or retained for the caller to write out. Nothing here ever
//! reads the same source twice.

use bytes::{Bytes, BytesMut};
use packsync_schema::{Hash, HashFormat};
use sha2::{Digest, Sha256, Sha512};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::io::murmur::Murmur2;

const READ_BUF: usize = 64 * 1024; // 64KB buffer

/// Incremental digest state for any supported [`HashFormat`].
#[derive(Debug, Clone)]
pub enum Hasher {
    /// SHA-1
    Sha1(sha1::Sha1),
    /// SHA-256
    Sha256(Sha256),
    /// SHA-512
    Sha512(Sha512),
    /// MD5
    Md5(md5::Md5),
    /// BLAKE3
    Blake3(Box<blake3::Hasher>),
    /// CurseForge fingerprint
    Murmur2(Murmur2),
}

impl Hasher {
    /// Fresh state for `format`.
    pub fn new(format: HashFormat) -> Self {
        match format {
            HashFormat::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashFormat::Sha256 => Self::Sha256(Sha256::new()),
            HashFormat::Sha512 => Self::Sha512(Sha512::new()),
            HashFormat::Md5 => Self::Md5(md5::Md5::new()),
            HashFormat::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashFormat::Murmur2 => Self::Murmur2(Murmur2::new()),
        }
    }

    /// Feed more input.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Md5(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::Murmur2(h) => h.update(data),
        }
    }

    /// Consume the state and produce the tagged digest.
    pub fn finalize(self) -> Hash {
        match self {
            Self::Sha1(h) => Hash::from_digest_bytes(HashFormat::Sha1, &h.finalize()),
            Self::Sha256(h) => Hash::from_digest_bytes(HashFormat::Sha256, &h.finalize()),
            Self::Sha512(h) => Hash::from_digest_bytes(HashFormat::Sha512, &h.finalize()),
            Self::Md5(h) => Hash::from_digest_bytes(HashFormat::Md5, &h.finalize()),
            Self::Blake3(h) => Hash::from_digest_bytes(HashFormat::Blake3, h.finalize().as_bytes()),
            Self::Murmur2(h) => Hash::from_murmur2(h.finalize()),
        }
    }
}

/// Digest an in-memory buffer.
pub fn digest_bytes(format: HashFormat, data: &[u8]) -> Hash {
    let mut hasher = Hasher::new(format);
    hasher.update(data);
    hasher.finalize()
}

/// Digest everything `reader` yields, discarding the bytes.
///
/// # Errors
///
/// Returns any I/O error raised while reading.
pub async fn digest_reader<R>(reader: R, format: HashFormat) -> std::io::Result<Hash>
where
    R: AsyncRead + Unpin,
{
    let (hash, _) = pump(reader, format, false).await?;
    Ok(hash)
}

/// Digest everything `reader` yields and hand the bytes back for writing.
///
/// # Errors
///
/// Returns any I/O error raised while reading.
pub async fn digest_buffered<R>(reader: R, format: HashFormat) -> std::io::Result<(Hash, Bytes)>
where
    R: AsyncRead + Unpin,
{
    pump(reader, format, true).await
}

async fn pump<R>(mut reader: R, format: HashFormat, keep: bool) -> std::io::Result<(Hash, Bytes)>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Hasher::new(format);
    let mut kept = BytesMut::new();
    let mut buffer = vec![0u8; READ_BUF];

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        if keep {
            kept.extend_from_slice(&buffer[..n]);
        }
    }

    Ok((hasher.finalize(), kept.freeze()))
}

/// SHA-256 of `data` as lowercase hex, for mismatch diagnostics.
pub fn diagnostic_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

//! Content sources: where catalog entries and files are read from.
//!
//! The engine only ever sees the [`ContentSource`] trait. [`HttpSource`]
//! serves `http(s)://` through a shared `reqwest::Client` and `file://`
//! straight from disk, so a pack can be installed from a local checkout as
//! easily as from a web host.

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use packsync_schema::{Hash, HashFormat, PackPath};
use reqwest::{Client, Url};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use crate::io::verify;

/// A readable byte stream handed out by a [`ContentSource`].
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request for {location} failed: {source}")]
    Request {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("IO error reading {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

impl SourceError {
    /// Wrap an I/O error with the location that produced it.
    pub fn io(location: &Url, source: std::io::Error) -> Self {
        Self::Io {
            location: location.to_string(),
            source,
        }
    }
}

/// Something that can produce the bytes behind a URL.
///
/// Implementations must be safe to share between concurrently running tasks.
/// Timeouts and cancellation belong here, not in the engine: a timed-out
/// `open` is just another error to the caller.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Open `location` for reading.
    async fn open(&self, location: &Url) -> Result<ByteStream, SourceError>;
}

#[async_trait]
impl<T: ContentSource + ?Sized> ContentSource for std::sync::Arc<T> {
    async fn open(&self, location: &Url) -> Result<ByteStream, SourceError> {
        (**self).open(location).await
    }
}

/// Reads `http(s)://` via reqwest and `file://` from the local filesystem.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

/// Upper bound on a single request, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpSource {
    /// Build a source with [`DEFAULT_TIMEOUT`] and the packsync user agent.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a source whose requests fail once `timeout` has elapsed.
    ///
    /// A stalled server surfaces as [`SourceError::Request`], like any other
    /// failed fetch.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn open(&self, location: &Url) -> Result<ByteStream, SourceError> {
        match location.scheme() {
            "http" | "https" => {
                let request_err = |source| SourceError::Request {
                    location: location.to_string(),
                    source,
                };
                let response = self
                    .client
                    .get(location.clone())
                    .send()
                    .await
                    .map_err(request_err)?
                    .error_for_status()
                    .map_err(request_err)?;

                let stream = response.bytes_stream().map_err(std::io::Error::other);
                Ok(Box::new(StreamReader::new(Box::pin(stream))))
            }
            "file" => {
                let path = location
                    .to_file_path()
                    .map_err(|()| SourceError::InvalidLocation {
                        location: location.to_string(),
                        reason: "not a local file path".to_string(),
                    })?;
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|e| SourceError::io(location, e))?;
                Ok(Box::new(file))
            }
            other => Err(SourceError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Open `location`, digest it with `format`, and return digest and bytes.
///
/// # Errors
///
/// Returns the source's error if it cannot be opened, or
/// [`SourceError::Io`] if reading fails part way.
pub async fn fetch_digested(
    source: &dyn ContentSource,
    location: &Url,
    format: HashFormat,
) -> Result<(Hash, Bytes), SourceError> {
    let stream = source.open(location).await?;
    verify::digest_buffered(stream, format)
        .await
        .map_err(|e| SourceError::io(location, e))
}

/// Parse a user-supplied location: an absolute URL, or a filesystem path.
///
/// # Errors
///
/// Returns [`SourceError::InvalidLocation`] if it is neither.
pub fn parse_location(raw: &str) -> Result<Url, SourceError> {
    // Single-letter schemes are Windows drive letters, not URLs.
    if let Ok(url) = Url::parse(raw) {
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let invalid = |reason: String| SourceError::InvalidLocation {
        location: raw.to_string(),
        reason,
    };
    let absolute = std::path::absolute(Path::new(raw)).map_err(|e| invalid(e.to_string()))?;
    Url::from_file_path(&absolute).map_err(|()| invalid("not an absolute path".to_string()))
}

/// Resolve a pack-relative path against the URL of the document listing it.
///
/// # Errors
///
/// Returns [`SourceError::InvalidLocation`] if the join fails.
pub fn resolve_relative(base: &Url, path: &PackPath) -> Result<Url, SourceError> {
    base.join(path.as_str())
        .map_err(|e| SourceError::InvalidLocation {
            location: format!("{base} + {path}"),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn resolves_relative_to_document() {
        let base = Url::parse("https://example.com/packs/main/pack.toml").unwrap();
        let path = PackPath::new("mods/a b.pw.toml").unwrap();
        assert_eq!(
            resolve_relative(&base, &path).unwrap().as_str(),
            "https://example.com/packs/main/mods/a%20b.pw.toml"
        );
    }

    #[test]
    fn parse_location_accepts_urls_and_paths() {
        let url = parse_location("https://example.com/pack.toml").unwrap();
        assert_eq!(url.scheme(), "https");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.toml");
        let url = parse_location(path.to_str().unwrap()).unwrap();
        assert_eq!(url.scheme(), "file");
        assert_eq!(url.to_file_path().unwrap(), path);
    }

    #[tokio::test]
    async fn reads_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let source = HttpSource::new().unwrap();
        let url = Url::from_file_path(&path).unwrap();
        let mut stream = source.open(&url).await.unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");

        let missing = Url::from_file_path(dir.path().join("missing")).unwrap();
        assert!(matches!(
            source.open(&missing).await,
            Err(SourceError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn fetches_over_http() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/files/a.txt")
            .with_status(200)
            .with_body("hello world")
            .create_async()
            .await;
        let gone = server
            .mock("GET", "/files/missing.txt")
            .with_status(404)
            .create_async()
            .await;

        let source = HttpSource::new().unwrap();
        let base = Url::parse(&server.url()).unwrap();

        let (hash, bytes) = fetch_digested(
            &source,
            &base.join("/files/a.txt").unwrap(),
            HashFormat::Sha256,
        )
        .await
        .unwrap();
        assert_eq!(bytes.as_ref(), b"hello world");
        assert_eq!(
            hash.as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );

        let err = source
            .open(&base.join("/files/missing.txt").unwrap())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::Request { .. }));

        ok.assert_async().await;
        gone.assert_async().await;
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let source = HttpSource::with_timeout(Duration::from_millis(300)).unwrap();
        let url = Url::parse(&format!("http://{addr}/index.toml")).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(10), source.open(&url))
            .await
            .expect("request should give up on its own");

        match result {
            Err(SourceError::Request { source, .. }) => assert!(source.is_timeout()),
            Err(other) => panic!("expected a request timeout, got {other}"),
            Ok(_) => panic!("expected a request timeout, got a response"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn rejects_unknown_schemes() {
        let source = HttpSource::new().unwrap();
        let url = Url::parse("ftp://example.com/a").unwrap();
        assert!(matches!(
            source.open(&url).await,
            Err(SourceError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }
}

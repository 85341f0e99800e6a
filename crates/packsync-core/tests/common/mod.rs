#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use packsync_core::io::source::{ByteStream, ContentSource, SourceError};
use packsync_core::io::verify::digest_bytes;
use packsync_core::{Catalog, ReconciliationTask};
use packsync_schema::{CacheRecord, HashFormat, Index, Platform, Side};
use reqwest::Url;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const INDEX_URL: &str = "https://pack.example/main/index.toml";

/// In-memory content source that counts every fetch.
#[derive(Default)]
pub struct MemorySource {
    files: Mutex<HashMap<String, Bytes>>,
    fetches: Mutex<Vec<String>>,
    total: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, url: &str, body: impl Into<Bytes>) {
        self.files.lock().unwrap().insert(url.to_string(), body.into());
    }

    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn fetches_of(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn open(&self, location: &Url) -> Result<ByteStream, SourceError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.fetches.lock().unwrap().push(location.to_string());
        let body = self.files.lock().unwrap().get(location.as_str()).cloned();
        match body {
            Some(bytes) => Ok(Box::new(std::io::Cursor::new(bytes))),
            None => Err(SourceError::io(
                location,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such entry"),
            )),
        }
    }
}

pub fn sha256(data: &[u8]) -> String {
    digest_bytes(HashFormat::Sha256, data).as_str().to_string()
}

pub fn url_of(path: &str) -> String {
    Url::parse(INDEX_URL).unwrap().join(path).unwrap().to_string()
}

/// A plain index entry served relative to the index.
pub fn plain(source: &MemorySource, path: &str, body: &str) -> String {
    source.insert(&url_of(path), body.to_string());
    format!("[[files]]\nfile = \"{path}\"\nhash = \"{}\"\n", sha256(body.as_bytes()))
}

/// Builder for a metafile entry and the file it links to.
pub struct Meta {
    pub path: &'static str,
    pub name: &'static str,
    pub filename: &'static str,
    pub side: &'static str,
    pub body: &'static str,
    pub optional: Option<(bool, &'static str)>,
    pub disabled_platforms: &'static [&'static str],
}

impl Meta {
    pub fn new(path: &'static str, filename: &'static str, body: &'static str) -> Self {
        Self {
            path,
            name: filename,
            filename,
            side: "both",
            body,
            optional: None,
            disabled_platforms: &[],
        }
    }

    pub fn download_url(&self) -> String {
        format!("https://cdn.example/{}", self.filename)
    }

    pub fn toml(&self) -> String {
        let platforms = self
            .disabled_platforms
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let mut out = format!(
            "name = \"{}\"\nfilename = \"{}\"\nside = \"{}\"\n\n[download]\nurl = \"{}\"\nhash-format = \"sha512\"\nhash = \"{}\"\ndisabled-client-platforms = [{platforms}]\n",
            self.name,
            self.filename,
            self.side,
            self.download_url(),
            digest_bytes(HashFormat::Sha512, self.body.as_bytes()).as_str(),
        );
        if let Some((default, description)) = self.optional {
            out.push_str(&format!(
                "\n[option]\noptional = true\ndefault = {default}\ndescription = \"{description}\"\n"
            ));
        }
        out
    }

    /// Register metafile and linked file with `source`, return the index entry.
    pub fn register(&self, source: &MemorySource) -> String {
        let toml = self.toml();
        source.insert(&url_of(self.path), toml.clone());
        source.insert(&self.download_url(), self.body);
        format!(
            "[[files]]\nfile = \"{}\"\nhash = \"{}\"\nmetafile = true\n",
            self.path,
            sha256(toml.as_bytes())
        )
    }
}

pub fn catalog(entries: &[String]) -> Arc<Catalog> {
    let text = format!("hash-format = \"sha256\"\n\n{}", entries.join("\n"));
    let index = Index::from_toml(&text).unwrap();
    Arc::new(Catalog::new(index, Url::parse(INDEX_URL).unwrap()))
}

/// Run every step for every task, the way a sync would without option prompts.
pub async fn run(
    catalog: &Arc<Catalog>,
    side: Side,
    platform: Platform,
    records: &BTreeMap<String, CacheRecord>,
    root: &Path,
    source: &dyn ContentSource,
) -> Vec<ReconciliationTask> {
    let mut tasks = ReconciliationTask::from_catalog(catalog, side, platform);
    for task in &mut tasks {
        let prior = records.get(task.key()).cloned();
        task.attach_record(prior);
        task.run(root, source).await;
    }
    tasks
}

pub fn records(tasks: Vec<ReconciliationTask>) -> BTreeMap<String, CacheRecord> {
    tasks.into_iter().map(ReconciliationTask::into_record).collect()
}

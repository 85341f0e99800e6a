//! packsync - modpack installation sync
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Brings a local installation in line with a published pack catalog.
//!
//! # Overview
//!
//! A pack is published as a `pack.toml` pointing at an `index.toml`, which in
//! turn lists every file of the installation. `packsync sync` fetches both,
//! reconciles each listed file against what is on disk, and records the
//! result in `packsync.json` so the next run only touches what changed.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── packsync.json   # Install manifest (what was verified, where)
//! ├── config/...      # Files listed directly in the index
//! └── mods/...        # Files resolved through metafiles
//! ```

pub mod cmd;
pub mod ops;

pub use packsync_core::USER_AGENT;

use clap::{Parser, Subcommand};
use packsync_schema::{HashFormat, Side};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "packsync")]
#[command(
    author,
    version = env!("PACKSYNC_VERSION"),
    about = "packsync - keep a modpack installation in sync"
)]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install or update a pack
    Sync {
        /// URL or path of the pack's pack.toml
        #[arg(env = "PACKSYNC_PACK_URL")]
        pack_url: String,
        /// Installation directory
        #[arg(long, env = "PACKSYNC_ROOT", default_value = ".")]
        root: PathBuf,
        /// Which side to install (client, server, both)
        #[arg(long, default_value = "client")]
        side: Side,
        /// Ignore cached state and re-verify every file
        #[arg(long)]
        recheck: bool,
        /// Maximum concurrent fetches
        #[arg(short, long, default_value_t = 8)]
        jobs: usize,
        /// Give up on a single request after this many seconds
        #[arg(long, env = "PACKSYNC_TIMEOUT", value_name = "SECS", default_value_t = 300)]
        timeout: u64,
        /// Select an optional file by name (repeatable)
        #[arg(long, value_name = "NAME")]
        enable: Vec<String>,
        /// Deselect an optional file by name (repeatable)
        #[arg(long, value_name = "NAME")]
        disable: Vec<String>,
    },
    /// Compute file digests (for pack authoring)
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Digest algorithm
        #[arg(long, default_value = "sha256")]
        format: HashFormat,
    },
    /// Show what the install manifest records
    Status {
        /// Installation directory
        #[arg(long, env = "PACKSYNC_ROOT", default_value = ".")]
        root: PathBuf,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

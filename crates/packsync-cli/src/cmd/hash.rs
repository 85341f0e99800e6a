//! Hash command

use anyhow::{Context, Result};
use packsync_core::io::verify;
use packsync_schema::HashFormat;
use std::path::PathBuf;

/// Print the digest of each file, in the form an index entry expects.
pub async fn hash(files: &[PathBuf], format: HashFormat) -> Result<()> {
    for file in files {
        let reader = tokio::fs::File::open(file)
            .await
            .with_context(|| format!("Failed to open {}", file.display()))?;
        let digest = verify::digest_reader(reader, format)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        println!("{} {}", digest.as_str(), file.display());
    }
    Ok(())
}

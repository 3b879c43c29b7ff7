use std::path::PathBuf;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::entry::StoredResponse;

/// One cache generation: a named directory of request/response entries.
///
/// Entries are JSON files named by the SHA-256 of the request URL, so
/// concurrent writers for the same URL overwrite each other whole-file
/// (last write wins) and different URLs never collide.
#[derive(Debug, Clone)]
pub struct CacheBucket {
    name: String,
    dir: PathBuf,
}

impl CacheBucket {
    pub fn new(name: String, dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache bucket: {}", name))?;
        Ok(Self { name, dir })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    pub fn get(&self, url: &str) -> Result<Option<StoredResponse>> {
        let path = self.entry_path(url);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache entry for {}", url))?;

        let entry: StoredResponse = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache entry for {}", url))?;

        Ok(Some(entry))
    }

    /// Overwrite the entry for the response's URL. Whole-entry puts only.
    pub fn put(&self, response: &StoredResponse) -> Result<()> {
        let path = self.entry_path(&response.url);
        let contents = serde_json::to_string_pretty(response)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache entry for {}", response.url))?;
        debug!(bucket = %self.name, url = %response.url, "Cached response");
        Ok(())
    }

    pub fn remove(&self, url: &str) -> Result<()> {
        let path = self.entry_path(url);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache entry for {}", url))?;
        }
        Ok(())
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every entry in the bucket, skipping ones that fail to parse.
    pub fn entries(&self) -> Result<Vec<StoredResponse>> {
        let mut out = Vec::new();
        for dir_entry in std::fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<StoredResponse>(&contents) {
                Ok(entry) => out.push(entry),
                Err(e) => {
                    debug!(bucket = %self.name, path = %path.display(), error = %e,
                        "Skipping unparseable cache entry");
                }
            }
        }
        Ok(out)
    }
}

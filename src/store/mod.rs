//! On-disk cache store for offline data access.
//!
//! The store is a root directory of named, versioned buckets (cache
//! generations). Each bucket holds request/response entries as JSON
//! files keyed by request URL. Exactly one generation per bucket kind
//! is current at any time; stale generations are deleted during the
//! activate lifecycle step.

pub mod bucket;
pub mod entry;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

pub use bucket::CacheBucket;
pub use entry::StoredResponse;

/// The three bucket kinds the worker maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    /// Pre-warmed install-manifest assets.
    Static,
    /// Documents and uncategorized same-origin requests.
    Dynamic,
    /// Scripts, stylesheets, images, fonts.
    Runtime,
}

/// Derives the current generation names: `<app>-static-<version>` etc.
#[derive(Debug, Clone)]
pub struct Generations {
    app: String,
    version: String,
}

impl Generations {
    pub fn new(app: &str, version: &str) -> Self {
        Self {
            app: app.to_string(),
            version: version.to_string(),
        }
    }

    pub fn name(&self, kind: BucketKind) -> String {
        let kind = match kind {
            BucketKind::Static => "static",
            BucketKind::Dynamic => "dynamic",
            BucketKind::Runtime => "runtime",
        };
        format!("{}-{}-{}", self.app, kind, self.version)
    }

    /// Short label identifying this generation set, used when claiming
    /// clients.
    pub fn label(&self) -> String {
        format!("{}-{}", self.app, self.version)
    }

    /// The complete set of names that survive activation.
    pub fn current_names(&self) -> Vec<String> {
        vec![
            self.name(BucketKind::Static),
            self.name(BucketKind::Dynamic),
            self.name(BucketKind::Runtime),
        ]
    }
}

/// Root directory holding all cache generations.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root).context("Failed to create cache store root")?;
        Ok(Self { root })
    }

    /// Open a bucket by name, creating it on first use.
    pub fn open(&self, name: &str) -> Result<CacheBucket> {
        CacheBucket::new(name.to_string(), self.root.join(name))
    }

    /// Names of all buckets currently on disk.
    pub fn bucket_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for dir_entry in std::fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_type()?.is_dir() {
                names.push(dir_entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete a bucket and all its entries. Deleting a bucket that does
    /// not exist is a no-op, so repeated activation cycles never fail.
    pub fn delete(&self, name: &str) -> Result<()> {
        let dir = self.root.join(name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to delete cache bucket: {}", name))?;
            debug!(bucket = name, "Deleted cache bucket");
        }
        Ok(())
    }

    /// Age display of the most recently stored entry, for status output.
    pub fn bucket_age(&self, name: &str) -> Option<String> {
        let bucket = self.open(name).ok()?;
        let entries = bucket.entries().ok()?;
        entries
            .into_iter()
            .max_by_key(|e| e.stored_at)
            .map(|e| e.age_display())
    }
}

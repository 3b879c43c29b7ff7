//! Worker lifecycle: install, activate, client claiming.
//!
//! Install pre-warms the static bucket from the install manifest and
//! fails whole if any manifest fetch fails, so a broken manifest never
//! ships a half-cached app. Activate evicts every bucket generation
//! outside the current set and claims all open clients. The hosting
//! side serializes install/activate, so no extra locking is needed
//! here.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::clients::ClientRegistry;
use crate::fetch::{FetchRequest, Fetcher};
use crate::policy::Destination;
use crate::store::{BucketKind, CacheStore, Generations};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Installing,
    Installed,
    Activating,
    Active,
}

pub struct LifecycleManager {
    store: CacheStore,
    generations: Generations,
    origin: String,
    manifest: Vec<String>,
    clients: ClientRegistry,
    phase: Option<WorkerPhase>,
}

impl LifecycleManager {
    pub fn new(
        store: CacheStore,
        generations: Generations,
        origin: &str,
        manifest: Vec<String>,
        clients: ClientRegistry,
    ) -> Self {
        Self {
            store,
            generations,
            origin: origin.trim_end_matches('/').to_string(),
            manifest,
            clients,
            phase: None,
        }
    }

    pub fn phase(&self) -> Option<WorkerPhase> {
        self.phase
    }

    /// Pre-warm the static bucket with every install-manifest asset.
    ///
    /// All manifest paths are fetched before anything is written, so a
    /// failed install leaves the static bucket exactly as it was. No
    /// retries here; on failure the previous worker generation stays
    /// active.
    pub async fn install(&mut self, fetcher: &dyn Fetcher) -> Result<()> {
        self.phase = Some(WorkerPhase::Installing);
        info!(assets = self.manifest.len(), "Installing: caching static assets");

        let mut fetched = Vec::with_capacity(self.manifest.len());
        for path in &self.manifest {
            let url = format!("{}{}", self.origin, path);
            let request = FetchRequest::get(&url, Destination::Other);
            let response = fetcher.get(&request).await.with_context(|| {
                format!("Install manifest fetch failed for {}", path)
            })?;
            fetched.push(response);
        }

        let bucket = self
            .store
            .open(&self.generations.name(BucketKind::Static))?;
        for response in &fetched {
            bucket.put(response)?;
        }

        // Skip the waiting phase: the new generation is ready to
        // activate immediately.
        self.phase = Some(WorkerPhase::Installed);
        info!(cached = fetched.len(), "Install complete, skipping waiting phase");
        Ok(())
    }

    /// Evict stale cache generations and claim all open clients.
    ///
    /// Idempotent: running it twice deletes nothing the second time and
    /// leaves exactly the three current-generation buckets present.
    pub fn activate(&mut self) -> Result<()> {
        self.phase = Some(WorkerPhase::Activating);
        let current = self.generations.current_names();

        for name in self.store.bucket_names()? {
            if !current.contains(&name) {
                if let Err(e) = self.store.delete(&name) {
                    // Keep going; a leftover bucket wastes disk but
                    // does not affect correctness.
                    warn!(bucket = %name, error = %e, "Failed to delete old cache generation");
                } else {
                    info!(bucket = %name, "Deleted old cache generation");
                }
            }
        }

        for name in &current {
            self.store.open(name)?;
        }

        let claimed = self.clients.claim(&self.generations.label());
        self.phase = Some(WorkerPhase::Active);
        info!(claimed, "Activated: current generations in place, clients claimed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedFetcher;

    const ORIGIN: &str = "http://localhost:4173";

    fn manifest() -> Vec<String> {
        vec!["/".to_string(), "/a.css".to_string()]
    }

    fn manager(root: &std::path::Path, version: &str) -> LifecycleManager {
        let store = CacheStore::new(root.to_path_buf()).expect("Failed to create store");
        LifecycleManager::new(
            store,
            Generations::new("portfolio", version),
            ORIGIN,
            manifest(),
            ClientRegistry::new(),
        )
    }

    #[tokio::test]
    async fn test_install_caches_every_manifest_asset() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let mut lifecycle = manager(tmp.path(), "v2");

        let fetcher = ScriptedFetcher::new();
        fetcher.respond("http://localhost:4173/", b"<html>home</html>");
        fetcher.respond("http://localhost:4173/a.css", b"body{}");

        lifecycle.install(&fetcher).await.expect("Install failed");
        assert_eq!(lifecycle.phase(), Some(WorkerPhase::Installed));

        let store = CacheStore::new(tmp.path().to_path_buf()).expect("Failed to open store");
        let bucket = store.open("portfolio-static-v2").expect("Failed to open bucket");
        assert_eq!(bucket.len(), 2);
        assert!(bucket.get("http://localhost:4173/a.css").expect("Lookup failed").is_some());
    }

    #[tokio::test]
    async fn test_failed_manifest_fetch_fails_install_without_partial_bucket() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let mut lifecycle = manager(tmp.path(), "v2");

        // "/" succeeds but "/a.css" 404s: the install must fail and the
        // static bucket must hold neither entry.
        let fetcher = ScriptedFetcher::new();
        fetcher.respond("http://localhost:4173/", b"<html>home</html>");
        fetcher.respond_status("http://localhost:4173/a.css", 404);

        assert!(lifecycle.install(&fetcher).await.is_err());

        let store = CacheStore::new(tmp.path().to_path_buf()).expect("Failed to open store");
        let bucket = store.open("portfolio-static-v2").expect("Failed to open bucket");
        assert!(bucket.is_empty());
    }

    #[tokio::test]
    async fn test_activate_twice_is_idempotent() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let mut lifecycle = manager(tmp.path(), "v2");

        lifecycle.activate().expect("First activate failed");
        lifecycle.activate().expect("Second activate failed");
        assert_eq!(lifecycle.phase(), Some(WorkerPhase::Active));

        let store = CacheStore::new(tmp.path().to_path_buf()).expect("Failed to open store");
        let names = store.bucket_names().expect("Failed to list buckets");
        assert_eq!(
            names,
            vec![
                "portfolio-dynamic-v2",
                "portfolio-runtime-v2",
                "portfolio-static-v2"
            ]
        );
    }

    #[tokio::test]
    async fn test_activation_evicts_previous_generation() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");

        let mut v1 = manager(tmp.path(), "v1");
        v1.activate().expect("v1 activate failed");

        let mut v2 = manager(tmp.path(), "v2");
        v2.activate().expect("v2 activate failed");

        let store = CacheStore::new(tmp.path().to_path_buf()).expect("Failed to open store");
        let names = store.bucket_names().expect("Failed to list buckets");
        assert!(names.iter().all(|n| n.ends_with("-v2")));
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn test_activation_claims_registered_clients() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let store = CacheStore::new(tmp.path().to_path_buf()).expect("Failed to create store");
        let clients = ClientRegistry::new();
        let id = clients.register("http://localhost:4173/");

        let mut lifecycle = LifecycleManager::new(
            store,
            Generations::new("portfolio", "v2"),
            ORIGIN,
            manifest(),
            clients.clone(),
        );
        lifecycle.activate().expect("Activate failed");

        assert_eq!(clients.controller_of(id).as_deref(), Some("portfolio-v2"));
    }
}

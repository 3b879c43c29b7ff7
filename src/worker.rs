//! The worker: event dispatch over the cache machinery.
//!
//! Maps each event kind to its handler, the same way the original
//! surface registers one listener per event. Fetch events go through
//! the policy selector and the chosen strategy; lifecycle events go to
//! the lifecycle manager; sync events drain the deferred queue.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::clients::ClientRegistry;
use crate::config::Config;
use crate::fetch::{FetchRequest, Fetcher};
use crate::lifecycle::{LifecycleManager, WorkerPhase};
use crate::notify::{build_notification, handle_click, ClickOutcome, Notification};
use crate::policy::{self, Policy};
use crate::store::{BucketKind, CacheStore, Generations, StoredResponse};
use crate::strategy::{cache_first, swr, ResponseSource, Served};
use crate::sync::{SubmissionQueue, SyncOutcome, SyncProcessor};

/// Everything the worker reacts to, keyed by event kind.
#[derive(Debug)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    Sync { tag: String },
    Push { payload: Option<String> },
    NotificationClick { action: String },
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    Installed,
    Activated,
    Served(Served),
    Synced(SyncOutcome),
    Notified(Notification),
    Clicked(ClickOutcome),
}

pub struct Worker {
    config: Config,
    store: CacheStore,
    generations: Generations,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: LifecycleManager,
    sync: SyncProcessor,
}

impl Worker {
    pub fn new(
        config: Config,
        bucket_root: PathBuf,
        queue_dir: PathBuf,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let store = CacheStore::new(bucket_root)?;
        let generations = Generations::new(&config.app_name, &config.cache_version);
        let clients = ClientRegistry::new();
        let lifecycle = LifecycleManager::new(
            store.clone(),
            generations.clone(),
            &config.origin,
            config.manifest.clone(),
            clients.clone(),
        );
        let queue = SubmissionQueue::new(queue_dir)?;
        let sync = SyncProcessor::new(queue, &config.origin);

        Ok(Self {
            config,
            store,
            generations,
            fetcher,
            lifecycle,
            sync,
        })
    }

    /// Park a contact-form payload for the next sync event.
    pub fn enqueue_submission(&self, data: serde_json::Value) -> Result<()> {
        self.sync.enqueue(data)
    }

    pub async fn handle_event(&mut self, event: WorkerEvent) -> Result<EventOutcome> {
        match event {
            WorkerEvent::Install => {
                self.lifecycle.install(self.fetcher.as_ref()).await?;
                Ok(EventOutcome::Installed)
            }
            WorkerEvent::Activate => {
                self.lifecycle.activate()?;
                Ok(EventOutcome::Activated)
            }
            WorkerEvent::Fetch(request) => {
                let served = self.handle_fetch(request).await?;
                Ok(EventOutcome::Served(served))
            }
            WorkerEvent::Sync { tag } => {
                let outcome = self.sync.process(&tag, self.fetcher.as_ref()).await?;
                Ok(EventOutcome::Synced(outcome))
            }
            WorkerEvent::Push { payload } => {
                Ok(EventOutcome::Notified(build_notification(payload.as_deref())))
            }
            WorkerEvent::NotificationClick { action } => {
                Ok(EventOutcome::Clicked(handle_click(&action)))
            }
        }
    }

    async fn handle_fetch(&self, request: FetchRequest) -> Result<Served> {
        let policy = policy::select(
            &request.method,
            request.destination,
            &request.url,
            &self.config.origin,
        );
        debug!(url = %request.url, ?policy, "Selected caching policy");

        match policy {
            Policy::Ignore => {
                // Not ours: pass through to the network untouched.
                let response = self
                    .fetcher
                    .get(&request)
                    .await
                    .with_context(|| format!("Pass-through fetch failed for {}", request.url))?;
                Ok(Served::new(response, ResponseSource::Network))
            }
            Policy::StaleWhileRevalidate(kind) => {
                let bucket = self.store.open(&self.generations.name(kind))?;
                let served = swr::serve(&request, &bucket, Arc::clone(&self.fetcher)).await?;
                // Before settling for the offline page, a navigation can
                // still be satisfied from the pre-warmed install assets.
                if served.source == ResponseSource::OfflinePage {
                    if let Some(prewarmed) = self.prewarmed(&request.url)? {
                        return Ok(Served::new(prewarmed, ResponseSource::Cache));
                    }
                }
                Ok(served)
            }
            Policy::CacheFirst(kind) => {
                let bucket = self.store.open(&self.generations.name(kind))?;
                cache_first::serve(&request, &bucket, self.fetcher.as_ref()).await
            }
        }
    }

    /// Look up a URL in the static bucket: the exact URL first, then
    /// the site root as the navigation fallback.
    fn prewarmed(&self, url: &str) -> Result<Option<StoredResponse>> {
        let bucket = self
            .store
            .open(&self.generations.name(BucketKind::Static))?;
        if let Some(entry) = bucket.get(url)? {
            return Ok(Some(entry));
        }
        let root = format!("{}/", self.config.origin.trim_end_matches('/'));
        bucket.get(&root)
    }

    pub fn status(&self) -> Result<StatusReport> {
        let mut buckets = Vec::new();
        for kind in [BucketKind::Static, BucketKind::Dynamic, BucketKind::Runtime] {
            let name = self.generations.name(kind);
            let entries = self.store.open(&name)?.len();
            let age = self.store.bucket_age(&name);
            buckets.push(BucketStatus { name, entries, age });
        }
        Ok(StatusReport {
            buckets,
            pending_submissions: self.sync.pending(),
            phase: self.lifecycle.phase(),
        })
    }
}

#[derive(Debug)]
pub struct BucketStatus {
    pub name: String,
    pub entries: usize,
    pub age: Option<String>,
}

#[derive(Debug)]
pub struct StatusReport {
    pub buckets: Vec<BucketStatus>,
    pub pending_submissions: usize,
    pub phase: Option<WorkerPhase>,
}

//! Stale-while-revalidate strategy.
//!
//! Every request kicks off a revalidation fetch. A fresh-enough cached
//! entry is returned without waiting on the network; a stale entry
//! waits for the revalidation and falls back to the stale copy when
//! the network fails; a miss waits and, for documents, degrades to the
//! synthesized offline page.
//!
//! The revalidation task owns the cache write. Its failures are logged
//! and never reach a caller that has already been handed a response.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use super::{ResponseSource, Served};
use crate::fetch::{FetchError, FetchRequest, Fetcher};
use crate::offline::offline_response;
use crate::policy::Destination;
use crate::store::CacheBucket;

pub async fn serve(
    request: &FetchRequest,
    bucket: &CacheBucket,
    fetcher: Arc<dyn Fetcher>,
) -> Result<Served> {
    // Revalidation starts before the cache lookup so the network race
    // is already running by the time a stale entry needs it.
    let revalidation = spawn_revalidation(request.clone(), bucket.clone(), fetcher);

    let cached = bucket.get(&request.url)?;

    match cached {
        Some(entry) if !entry.is_stale() => {
            // Fresh enough: the detached revalidation silently updates
            // the bucket for next time.
            Ok(Served::new(entry, ResponseSource::Cache))
        }
        Some(entry) => match revalidation.await {
            Ok(Ok(fresh)) => Ok(Served::new(fresh, ResponseSource::Network)),
            Ok(Err(e)) => {
                debug!(url = %request.url, error = %e, "Revalidation failed, serving stale entry");
                Ok(Served::new(entry, ResponseSource::StaleCache))
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Revalidation task aborted, serving stale entry");
                Ok(Served::new(entry, ResponseSource::StaleCache))
            }
        },
        None => match revalidation.await {
            Ok(Ok(fresh)) => Ok(Served::new(fresh, ResponseSource::Network)),
            Ok(Err(e)) if request.destination == Destination::Document => {
                debug!(url = %request.url, error = %e, "Offline with empty cache, serving offline page");
                Ok(Served::new(offline_response(&request.url), ResponseSource::OfflinePage))
            }
            Ok(Err(e)) => {
                Err(e).with_context(|| format!("Fetch failed with empty cache for {}", request.url))
            }
            Err(e) => Err(e).context("Revalidation task aborted"),
        },
    }
}

/// Fetch and, on success, overwrite the bucket entry. The returned
/// handle is awaited only by the stale and miss paths; the fresh path
/// leaves it detached.
fn spawn_revalidation(
    request: FetchRequest,
    bucket: CacheBucket,
    fetcher: Arc<dyn Fetcher>,
) -> tokio::task::JoinHandle<Result<crate::store::StoredResponse, FetchError>> {
    tokio::spawn(async move {
        match fetcher.get(&request).await {
            Ok(response) => {
                if response.is_success() {
                    if let Err(e) = bucket.put(&response) {
                        debug!(bucket = bucket.name(), url = %request.url, error = %e,
                            "Background cache write failed");
                    }
                }
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Background revalidation fetch failed");
                Err(e)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoredResponse;
    use crate::testutil::ScriptedFetcher;
    use chrono::{Duration, Utc};

    fn bucket(dir: &std::path::Path) -> CacheBucket {
        CacheBucket::new("portfolio-dynamic-v2".to_string(), dir.join("dynamic"))
            .expect("Failed to create test bucket")
    }

    fn seed(bucket: &CacheBucket, url: &str, body: &[u8], age_hours: i64) {
        let mut entry = StoredResponse::new(url.to_string(), 200, vec![], body.to_vec());
        entry.stored_at = Utc::now() - Duration::hours(age_hours);
        bucket.put(&entry).expect("Failed to seed bucket");
    }

    #[tokio::test]
    async fn test_fresh_entry_served_even_when_network_hangs() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let bucket = bucket(tmp.path());
        seed(&bucket, "http://localhost:4173/", b"cached home", 1);

        // A fetcher that never resolves must not delay the response.
        let fetcher = Arc::new(ScriptedFetcher::new().hanging());
        let request = FetchRequest::get("http://localhost:4173/", Destination::Document);
        let served = serve(&request, &bucket, fetcher).await.expect("Serve failed");

        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, b"cached home");
    }

    #[tokio::test]
    async fn test_stale_entry_replaced_by_fresh_network_content() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let bucket = bucket(tmp.path());
        seed(&bucket, "http://localhost:4173/", b"old home", 25);

        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost:4173/", b"fresh home");

        let request = FetchRequest::get("http://localhost:4173/", Destination::Document);
        let served = serve(&request, &bucket, fetcher).await.expect("Serve failed");

        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body, b"fresh home");

        // The revalidation overwrote the bucket entry.
        let cached = bucket
            .get("http://localhost:4173/")
            .expect("Lookup failed")
            .expect("Entry missing");
        assert_eq!(cached.body, b"fresh home");
        assert!(!cached.is_stale());
    }

    #[tokio::test]
    async fn test_stale_entry_survives_network_failure() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let bucket = bucket(tmp.path());
        seed(&bucket, "http://localhost:4173/", b"old home", 25);

        let fetcher = Arc::new(ScriptedFetcher::new()); // unreachable network
        let request = FetchRequest::get("http://localhost:4173/", Destination::Document);
        let served = serve(&request, &bucket, fetcher).await.expect("Serve failed");

        assert_eq!(served.source, ResponseSource::StaleCache);
        assert_eq!(served.response.body, b"old home");
    }

    #[tokio::test]
    async fn test_miss_with_network_returns_and_caches_response() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let bucket = bucket(tmp.path());

        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost:4173/projekte", b"projects page");

        let request = FetchRequest::get("http://localhost:4173/projekte", Destination::Document);
        let served = serve(&request, &bucket, fetcher).await.expect("Serve failed");

        assert_eq!(served.source, ResponseSource::Network);
        assert!(bucket
            .get("http://localhost:4173/projekte")
            .expect("Lookup failed")
            .is_some());
    }

    #[tokio::test]
    async fn test_document_miss_without_network_serves_offline_page() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let bucket = bucket(tmp.path());

        let fetcher = Arc::new(ScriptedFetcher::new());
        let request = FetchRequest::get("http://localhost:4173/kontakt", Destination::Document);
        let served = serve(&request, &bucket, fetcher).await.expect("Serve failed");

        assert_eq!(served.source, ResponseSource::OfflinePage);
        let body = String::from_utf8(served.response.body).expect("Offline page is not UTF-8");
        assert!(body.contains("Offline"));
        assert!(body.contains("location.reload()"));
    }

    #[tokio::test]
    async fn test_asset_miss_without_network_propagates_error() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let bucket = bucket(tmp.path());

        let fetcher = Arc::new(ScriptedFetcher::new());
        let request = FetchRequest::get("http://localhost:4173/assets/app.js", Destination::Script);
        assert!(serve(&request, &bucket, fetcher).await.is_err());
    }
}

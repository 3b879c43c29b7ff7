//! Cache-first strategy: serve from cache, fall back to network.
//!
//! Used for deterministic asset requests where a failure should stay
//! visible. A hit never touches the network; a miss fetches, populates
//! the bucket, and returns the network response; a miss with no
//! network propagates the error unchanged.

use anyhow::{Context, Result};
use tracing::warn;

use super::{ResponseSource, Served};
use crate::fetch::{FetchRequest, Fetcher};
use crate::store::CacheBucket;

pub async fn serve(
    request: &FetchRequest,
    bucket: &CacheBucket,
    fetcher: &dyn Fetcher,
) -> Result<Served> {
    if let Some(cached) = bucket.get(&request.url)? {
        return Ok(Served::new(cached, ResponseSource::Cache));
    }

    let response = fetcher
        .get(request)
        .await
        .with_context(|| format!("Cache-first fetch failed for {}", request.url))?;

    // The response is already committed to the caller; a write failure
    // only costs the next request a refetch.
    if response.is_success() {
        if let Err(e) = bucket.put(&response) {
            warn!(bucket = bucket.name(), url = %request.url, error = %e,
                "Failed to cache fetched response");
        }
    }

    Ok(Served::new(response, ResponseSource::Network))
}

//! Caching strategies.
//!
//! Two strategies cover every request the policy selector claims:
//! cache-first for deterministic assets, stale-while-revalidate for
//! documents and runtime assets that should self-heal to fresh content
//! whenever connectivity exists.

pub mod cache_first;
pub mod swr;

use crate::store::StoredResponse;

/// Where a served response came from. Logged and surfaced by the
/// `fetch` command; tests assert on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    StaleCache,
    OfflinePage,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
            ResponseSource::StaleCache => "stale-cache",
            ResponseSource::OfflinePage => "offline-page",
        }
    }
}

/// A response plus the provenance a strategy decided on.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: StoredResponse,
    pub source: ResponseSource,
}

impl Served {
    pub fn new(response: StoredResponse, source: ResponseSource) -> Self {
        Self { response, source }
    }
}

//! Scripted fetcher shared by strategy, lifecycle and worker tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fetch::{FetchError, FetchRequest, Fetcher};
use crate::store::StoredResponse;

/// A fetcher with canned routes. URLs without a route behave as an
/// unreachable network; `hanging()` makes every fetch block forever.
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Vec<u8>>>,
    statuses: Mutex<HashMap<String, u16>>,
    hang: bool,
    get_calls: AtomicUsize,
    posts: Mutex<Vec<(String, serde_json::Value)>>,
    fail_posts_containing: Mutex<Option<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
            hang: false,
            get_calls: AtomicUsize::new(0),
            posts: Mutex::new(Vec::new()),
            fail_posts_containing: Mutex::new(None),
        }
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Script a 200 response with the given body for a URL.
    pub fn respond(&self, url: &str, body: &[u8]) {
        self.routes
            .lock()
            .expect("routes lock poisoned")
            .insert(url.to_string(), body.to_vec());
    }

    /// Script a non-success HTTP status for a URL.
    pub fn respond_status(&self, url: &str, status: u16) {
        self.statuses
            .lock()
            .expect("statuses lock poisoned")
            .insert(url.to_string(), status);
    }

    /// Fail any POST whose JSON body contains this substring.
    pub fn fail_posts_containing(&self, marker: &str) {
        *self
            .fail_posts_containing
            .lock()
            .expect("marker lock poisoned") = Some(marker.to_string());
    }

    /// Drop every scripted route so later fetches see a dead network.
    pub fn go_offline(&self) {
        self.routes.lock().expect("routes lock poisoned").clear();
        self.statuses.lock().expect("statuses lock poisoned").clear();
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().expect("posts lock poisoned").clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, request: &FetchRequest) -> Result<StoredResponse, FetchError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = self
            .statuses
            .lock()
            .expect("statuses lock poisoned")
            .get(&request.url)
        {
            return Err(FetchError::from_status(*status, "scripted error"));
        }

        let body = self
            .routes
            .lock()
            .expect("routes lock poisoned")
            .get(&request.url)
            .cloned();

        match body {
            Some(body) => Ok(StoredResponse::new(
                request.url.clone(),
                200,
                vec![("Content-Type".to_string(), "text/html".to_string())],
                body,
            )),
            None => Err(FetchError::Unreachable(format!("no route to {}", request.url))),
        }
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16, FetchError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.posts
            .lock()
            .expect("posts lock poisoned")
            .push((url.to_string(), body.clone()));

        let marker = self
            .fail_posts_containing
            .lock()
            .expect("marker lock poisoned")
            .clone();
        if let Some(marker) = marker {
            if body.to_string().contains(&marker) {
                return Err(FetchError::ServerError("scripted post failure".to_string()));
            }
        }
        Ok(200)
    }
}

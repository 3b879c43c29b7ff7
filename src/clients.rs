//! Registry of open page clients.
//!
//! Stands in for the platform's client list: each connected page
//! registers once, and activation claims every registered client for
//! the new worker generation without requiring a reload.

use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct ClientEntry {
    id: Uuid,
    url: String,
    controller: Option<String>,
}

/// Shared, clonable registry. Interior state is small; a plain mutex
/// is enough since no lock is held across await points.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<Mutex<Vec<ClientEntry>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open page. Returns its client id.
    pub fn register(&self, url: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .lock()
            .expect("client registry lock poisoned")
            .push(ClientEntry {
                id,
                url: url.to_string(),
                controller: None,
            });
        id
    }

    /// Take control of every registered client for `generation`.
    /// Returns how many clients changed controller.
    pub fn claim(&self, generation: &str) -> usize {
        let mut clients = self.inner.lock().expect("client registry lock poisoned");
        let mut claimed = 0;
        for client in clients.iter_mut() {
            if client.controller.as_deref() != Some(generation) {
                client.controller = Some(generation.to_string());
                debug!(client = %client.url, generation, "Claimed client");
                claimed += 1;
            }
        }
        claimed
    }

    pub fn controller_of(&self, id: Uuid) -> Option<String> {
        self.inner
            .lock()
            .expect("client registry lock poisoned")
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.controller.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("client registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

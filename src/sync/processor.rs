use anyhow::Result;
use tracing::{debug, info, warn};

use super::queue::SubmissionQueue;
use crate::fetch::Fetcher;

/// The only sync tag this worker handles.
pub const CONTACT_SYNC_TAG: &str = "contact-form-sync";

/// Where queued contact-form payloads are replayed to.
const CONTACT_ENDPOINT: &str = "/api/contact";

/// Result of draining the queue once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub delivered: usize,
    pub failed: usize,
}

pub struct SyncProcessor {
    queue: SubmissionQueue,
    endpoint: String,
}

impl SyncProcessor {
    pub fn new(queue: SubmissionQueue, origin: &str) -> Self {
        Self {
            queue,
            endpoint: format!("{}{}", origin.trim_end_matches('/'), CONTACT_ENDPOINT),
        }
    }

    pub fn enqueue(&self, data: serde_json::Value) -> Result<()> {
        self.queue.enqueue(data)?;
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Replay every queued submission for a sync event.
    ///
    /// A submission is removed only after a confirmed success; an
    /// individual failure leaves the item queued and never aborts the
    /// rest of the batch. Unknown tags are ignored.
    pub async fn process(&self, tag: &str, fetcher: &dyn Fetcher) -> Result<SyncOutcome> {
        if tag != CONTACT_SYNC_TAG {
            debug!(tag, "Ignoring unknown sync tag");
            return Ok(SyncOutcome::default());
        }

        let pending = self.queue.load_all()?;
        let mut outcome = SyncOutcome::default();

        for submission in pending {
            match fetcher.post_json(&self.endpoint, &submission.data).await {
                Ok(status) => {
                    self.queue.remove(submission.id)?;
                    outcome.delivered += 1;
                    info!(id = %submission.id, status, "Contact form submission synced");
                }
                Err(e) => {
                    outcome.failed += 1;
                    warn!(id = %submission.id, error = %e,
                        "Failed to sync submission, leaving it queued");
                }
            }
        }

        Ok(outcome)
    }
}

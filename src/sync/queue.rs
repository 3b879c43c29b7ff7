use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// One queued contact-form payload awaiting network availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub id: Uuid,
    pub data: serde_json::Value,
    pub queued_at: DateTime<Utc>,
}

/// Durable queue of pending submissions, one JSON file per entry.
///
/// Entries survive worker restarts; a queue reopened on the same
/// directory sees everything that was not yet removed.
#[derive(Debug, Clone)]
pub struct SubmissionQueue {
    dir: PathBuf,
}

impl SubmissionQueue {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir).context("Failed to create submission queue directory")?;
        Ok(Self { dir })
    }

    fn entry_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub fn enqueue(&self, data: serde_json::Value) -> Result<PendingSubmission> {
        let submission = PendingSubmission {
            id: Uuid::new_v4(),
            data,
            queued_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&submission)?;
        std::fs::write(self.entry_path(submission.id), contents)
            .context("Failed to persist queued submission")?;
        debug!(id = %submission.id, "Queued submission for deferred sync");
        Ok(submission)
    }

    /// All pending submissions, oldest first. Unparseable files are
    /// skipped rather than blocking the rest of the queue.
    pub fn load_all(&self) -> Result<Vec<PendingSubmission>> {
        let mut pending = Vec::new();
        for dir_entry in std::fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<PendingSubmission>(&contents) {
                Ok(submission) => pending.push(submission),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping unparseable queue entry");
                }
            }
        }
        pending.sort_by_key(|s| s.queued_at);
        Ok(pending)
    }

    /// Remove a delivered submission. Removing an id that is already
    /// gone is a no-op.
    pub fn remove(&self, id: Uuid) -> Result<()> {
        let path = self.entry_path(id);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove queued submission {}", id))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("json"))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Deferred contact-form sync.
//!
//! Submissions that cannot reach the network are parked in a durable
//! on-disk queue and replayed when a sync event with the
//! `contact-form-sync` tag arrives. Each submission fails or succeeds
//! on its own; a failed item stays queued for the next sync attempt.

pub mod processor;
pub mod queue;

pub use processor::{SyncOutcome, SyncProcessor, CONTACT_SYNC_TAG};
pub use queue::{PendingSubmission, SubmissionQueue};

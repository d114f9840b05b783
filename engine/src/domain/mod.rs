//! Domain types and services for activity reconciliation.
//!
//! Purpose: hold everything that does not touch a network socket: the
//! key-convention transcoder, the child-set differ, the two child
//! synchronizers, and the parent upsert orchestrator. Remote stores are
//! reached exclusively through the traits in [`ports`].

pub mod activity;
pub mod attachment;
pub mod diff;
pub mod error;
pub mod participant;
pub mod ports;
pub mod transcode;

mod activity_service;
mod attachment_sync;
mod participant_sync;

#[cfg(test)]
mod activity_service_tests;

pub use self::activity::{ActivityId, ActivityKind, TravelerId, TripId, UserId};
pub use self::activity_service::{ActivitySyncService, NormalizedActivity, UpsertActivity};
pub use self::attachment::Attachment;
pub use self::attachment_sync::AttachmentSynchronizer;
pub use self::diff::{ChildSetDiff, diff_children};
pub use self::error::SyncError;
pub use self::participant::Participant;
pub use self::participant_sync::{ParticipantSyncOutcome, ParticipantSynchronizer};
pub use self::transcode::{to_app_convention, to_store_convention};

/// Convenient result alias for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

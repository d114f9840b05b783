//! Engine-level error type.
//!
//! Store and blob failures are always fatal to the current call; there are
//! no retries anywhere in this subsystem. Because child synchronization is
//! not transactional, an error may leave remote state partially updated;
//! the next successful sync converges again, since diffs always run
//! against current remote state.

use thiserror::Error;

use super::ports::{BlobStoreError, TableStoreError};

/// Errors surfaced by the synchronizers and the upsert orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The relational store reported a failure.
    #[error("relational store operation failed: {0}")]
    Store(#[from] TableStoreError),
    /// The blob store reported a failure.
    #[error("blob store operation failed: {0}")]
    Blob(#[from] BlobStoreError),
    /// A row returned by the store did not match the expected shape.
    #[error("row could not be decoded: {message}")]
    Row {
        /// What failed to decode.
        message: String,
    },
    /// A parent write returned no row to carry on with.
    #[error("no parent row returned by {operation}")]
    MissingParentRow {
        /// The write that came back empty.
        operation: &'static str,
    },
    /// A desired new attachment arrived without its binary payload.
    #[error("attachment {file_name} has no payload to upload")]
    MissingPayload {
        /// Filename of the payload-less attachment.
        file_name: String,
    },
}

impl SyncError {
    /// Helper for undecodable rows.
    pub fn row(message: impl Into<String>) -> Self {
        Self::Row {
            message: message.into(),
        }
    }
}

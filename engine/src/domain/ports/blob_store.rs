//! Port for binary blob storage.
//!
//! Blobs are addressed by path and served through public URLs. The URL
//! shape is an adapter detail, so translating a public URL back into the
//! path it was minted from also lives behind this port.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by blob store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobStoreError {
    /// The request never completed (connection refused, timeout).
    #[error("blob transport failed: {message}")]
    Transport {
        /// Adapter-provided failure description.
        message: String,
    },
    /// The store rejected an upload.
    #[error("blob upload failed for {path}: {message}")]
    Upload {
        /// Path the upload targeted.
        path: String,
        /// Adapter-provided failure description.
        message: String,
    },
    /// The store rejected a removal.
    #[error("blob removal failed: {message}")]
    Remove {
        /// Adapter-provided failure description.
        message: String,
    },
}

impl BlobStoreError {
    /// Helper for transport-level failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for rejected uploads.
    pub fn upload(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Helper for rejected removals.
    pub fn remove(message: impl Into<String>) -> Self {
        Self::Remove {
            message: message.into(),
        }
    }
}

/// Port for uploading, resolving, and removing attachment blobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `bytes` to `path`, overwriting nothing: paths are
    /// timestamp-qualified by the caller and never reused.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), BlobStoreError>;

    /// Public URL under which the blob at `path` is served.
    fn public_url(&self, path: &str) -> String;

    /// Recover the storage path a public URL was minted from.
    ///
    /// Returns `None` when the URL does not belong to this store.
    fn path_for_public_url(&self, url: &str) -> Option<String>;

    /// Remove every blob in `paths` in one call.
    async fn remove(&self, paths: &[String]) -> Result<(), BlobStoreError>;
}

/// Fixture implementation for tests that never touch blob storage.
///
/// Uploads and removals succeed without side effects; URLs are minted
/// under a reserved test origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBlobStore;

const FIXTURE_ORIGIN: &str = "https://blobs.invalid/";

#[async_trait]
impl BlobStore for FixtureBlobStore {
    async fn upload(&self, _path: &str, _bytes: Vec<u8>) -> Result<(), BlobStoreError> {
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{FIXTURE_ORIGIN}{path}")
    }

    fn path_for_public_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(FIXTURE_ORIGIN).map(str::to_owned)
    }

    async fn remove(&self, _paths: &[String]) -> Result<(), BlobStoreError> {
        Ok(())
    }
}

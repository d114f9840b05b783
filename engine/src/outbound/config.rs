//! Adapter configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BLOB_BUCKET: &str = "attachments";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Connection settings for the hosted store adapters.
///
/// Values are layered from environment variables (prefix `TRIPSYNC`),
/// configuration files, and command-line flags; the domain never reads
/// configuration, only the adapters do.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TRIPSYNC")]
pub struct StoreSettings {
    /// Base URL of the hosted store, e.g. `https://project.example.co/`.
    pub base_url: String,
    /// API key sent with every relational and blob request.
    pub api_key: String,
    /// Bucket holding attachment blobs.
    pub blob_bucket: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: Option<u64>,
}

impl StoreSettings {
    /// Return the configured bucket, falling back to the default.
    #[must_use]
    pub fn blob_bucket(&self) -> &str {
        self.blob_bucket.as_deref().unwrap_or(DEFAULT_BLOB_BUCKET)
    }

    /// Return the configured request timeout, falling back to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

//! Reqwest-backed adapters for a PostgREST-style hosted store.

mod blob_store;
mod table_store;

pub use blob_store::RestBlobStore;
pub use table_store::RestTableStore;

use thiserror::Error;

/// Errors raised while constructing a REST adapter.
#[derive(Debug, Error)]
pub enum RestAdapterError {
    /// The configured base URL could not be parsed.
    #[error("invalid store base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    /// The HTTP client could not be built.
    #[error("http client construction failed: {0}")]
    Client(#[from] reqwest::Error),
}

//! Driven ports at the engine's hexagonal boundary.
//!
//! Ports describe how the domain expects to reach the hosted relational
//! store and the blob store. Each trait exposes strongly typed errors so
//! adapters map their failures into predictable variants, and each has a
//! fixture implementation for tests that do not exercise the port.

mod blob_store;
mod table_store;

#[cfg(test)]
pub use blob_store::MockBlobStore;
pub use blob_store::{BlobStore, BlobStoreError, FixtureBlobStore};
#[cfg(test)]
pub use table_store::MockTableStore;
pub use table_store::{EqFilter, FixtureTableStore, TableStore, TableStoreError};

//! Outbound adapters implementing the domain ports.
//!
//! Adapters are thin translators between the ports and the hosted store's
//! HTTP surface. They contain no reconciliation logic: the domain decides
//! what to write, adapters only carry the bytes.
//!
//! - **rest**: PostgREST-style relational store and object-storage blob
//!   store, both over `reqwest`.
//! - **config**: adapter settings loaded via `OrthoConfig`.

pub mod config;
pub mod rest;

pub use config::StoreSettings;
pub use rest::{RestAdapterError, RestBlobStore, RestTableStore};

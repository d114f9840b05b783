//! Port for the hosted relational store.
//!
//! The store exposes per-table CRUD with equality filters only. Rows cross
//! this boundary as raw JSON values in the store's own snake_case
//! convention; the transcoder owns the translation, not the adapter.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// One equality filter applied to a table operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EqFilter {
    /// Store-convention column name.
    pub column: String,
    /// Value the column must equal.
    pub value: Value,
}

impl EqFilter {
    /// Build a filter matching rows where `column` equals `value`.
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Errors surfaced by relational store adapters.
///
/// The remote API reports failures in its response body rather than
/// raising them; adapters convert every such response into one of these
/// variants so the engine can abort the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableStoreError {
    /// The request never completed (connection refused, timeout).
    #[error("store transport failed: {message}")]
    Transport {
        /// Adapter-provided failure description.
        message: String,
    },
    /// The store rejected the operation (constraint violation, bad filter).
    #[error("store query failed: {message}")]
    Query {
        /// Adapter-provided failure description.
        message: String,
    },
    /// The response body could not be decoded into rows.
    #[error("store response could not be decoded: {message}")]
    Decode {
        /// Adapter-provided failure description.
        message: String,
    },
}

impl TableStoreError {
    /// Helper for transport-level failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for rejected operations.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for undecodable responses.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Port for per-table CRUD against the relational store.
///
/// All row values are in store convention (snake_case keys, `null` for
/// absent values). `insert` and `update` return the affected rows as the
/// store persisted them, which is how the engine learns store-assigned
/// identifiers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch rows matching every filter, projecting `columns`.
    ///
    /// `columns` is a comma-separated projection list, `"*"` for all.
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[EqFilter],
    ) -> Result<Vec<Value>, TableStoreError>;

    /// Insert rows in one call, returning them as persisted.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, TableStoreError>;

    /// Patch rows matching every filter, returning them as persisted.
    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[EqFilter],
    ) -> Result<Vec<Value>, TableStoreError>;

    /// Delete rows matching every filter.
    async fn delete(&self, table: &str, filters: &[EqFilter]) -> Result<(), TableStoreError>;
}

/// Fixture implementation for tests that never touch the store.
///
/// Selects return no rows, inserts echo their input, updates return no
/// rows, and deletes succeed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTableStore;

#[async_trait]
impl TableStore for FixtureTableStore {
    async fn select(
        &self,
        _table: &str,
        _columns: &str,
        _filters: &[EqFilter],
    ) -> Result<Vec<Value>, TableStoreError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _table: &str, rows: Vec<Value>) -> Result<Vec<Value>, TableStoreError> {
        Ok(rows)
    }

    async fn update(
        &self,
        _table: &str,
        _patch: Value,
        _filters: &[EqFilter],
    ) -> Result<Vec<Value>, TableStoreError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _table: &str, _filters: &[EqFilter]) -> Result<(), TableStoreError> {
        Ok(())
    }
}

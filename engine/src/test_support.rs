//! Test utilities for the engine crate.
//!
//! Provides in-memory implementations of the store ports for unit tests
//! (in `src/`) and integration tests (in `tests/`), compiled only under
//! test or the `test-support` feature. Both adapters count their write
//! operations so convergence tests can assert "no further writes".

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ports::{
    BlobStore, BlobStoreError, EqFilter, TableStore, TableStoreError,
};

/// In-memory relational store keyed by table name.
///
/// Rows are stored as raw JSON objects in store convention, exactly as a
/// remote store would hold them. Inserted rows receive sequential string
/// ids when they do not carry one.
#[derive(Debug, Default)]
pub struct InMemoryTableStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryTableStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the rows currently held by `table`.
    ///
    /// # Panics
    /// Panics when the table lock is poisoned; test-only code.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .expect("table lock poisoned")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of insert calls issued so far.
    #[must_use]
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of update calls issued so far.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Number of delete calls issued so far.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn matches(row: &Value, filters: &[EqFilter]) -> bool {
        filters
            .iter()
            .all(|filter| row.get(&filter.column) == Some(&filter.value))
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn select(
        &self,
        table: &str,
        _columns: &str,
        filters: &[EqFilter],
    ) -> Result<Vec<Value>, TableStoreError> {
        // Projection is ignored; returning whole rows is harmless here.
        let tables = self.tables.lock().map_err(|_| poisoned())?;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| Self::matches(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, TableStoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().map_err(|_| poisoned())?;
        let stored = tables.entry(table.to_owned()).or_default();
        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            if let Some(members) = row.as_object_mut() {
                if !members.contains_key("id") {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                    members.insert("id".to_owned(), Value::String(id.to_string()));
                }
            }
            stored.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[EqFilter],
    ) -> Result<Vec<Value>, TableStoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let patch = patch
            .as_object()
            .ok_or_else(|| TableStoreError::query("patch must be an object"))?
            .clone();

        let mut tables = self.tables.lock().map_err(|_| poisoned())?;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| Self::matches(row, filters)) {
                if let Some(members) = row.as_object_mut() {
                    for (key, value) in &patch {
                        members.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[EqFilter]) -> Result<(), TableStoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().map_err(|_| poisoned())?;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !Self::matches(row, filters));
        }
        Ok(())
    }
}

fn poisoned() -> TableStoreError {
    TableStoreError::transport("table lock poisoned")
}

/// Public origin the in-memory blob store mints URLs under.
pub const TEST_BLOB_ORIGIN: &str = "https://blobs.test/";

/// In-memory blob store addressed by path.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
    removals: AtomicUsize,
}

impl InMemoryBlobStore {
    /// Create an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of every blob currently stored, unordered.
    ///
    /// # Panics
    /// Panics when the blob lock is poisoned; test-only code.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.blobs
            .lock()
            .expect("blob lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Whether a blob exists at `path`.
    ///
    /// # Panics
    /// Panics when the blob lock is poisoned; test-only code.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.blobs
            .lock()
            .expect("blob lock poisoned")
            .contains_key(path)
    }

    /// Number of upload calls issued so far.
    #[must_use]
    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Number of remove calls issued so far.
    #[must_use]
    pub fn remove_calls(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), BlobStoreError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .lock()
            .map_err(|_| BlobStoreError::transport("blob lock poisoned"))?
            .insert(path.to_owned(), bytes);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{TEST_BLOB_ORIGIN}{path}")
    }

    fn path_for_public_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(TEST_BLOB_ORIGIN).map(str::to_owned)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), BlobStoreError> {
        self.removals.fetch_add(1, Ordering::SeqCst);
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| BlobStoreError::transport("blob lock poisoned"))?;
        for path in paths {
            blobs.remove(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Sanity checks for the in-memory adapters themselves.

    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryTableStore::new();
        let inserted = store
            .insert("boats", vec![json!({ "name": "a" }), json!({ "name": "b" })])
            .await
            .expect("insert should succeed");

        assert_eq!(inserted[0].get("id"), Some(&json!("1")));
        assert_eq!(inserted[1].get("id"), Some(&json!("2")));
        assert_eq!(store.rows("boats").len(), 2);
    }

    #[tokio::test]
    async fn filters_apply_to_select_update_and_delete() {
        let store = InMemoryTableStore::new();
        store
            .insert(
                "boat_travelers",
                vec![
                    json!({ "traveler_id": 7, "activity_id": "a" }),
                    json!({ "traveler_id": 9, "activity_id": "b" }),
                ],
            )
            .await
            .expect("insert should succeed");

        let filter = [EqFilter::new("activity_id", "a")];
        let selected = store
            .select("boat_travelers", "*", &filter)
            .await
            .expect("select should succeed");
        assert_eq!(selected.len(), 1);

        let updated = store
            .update("boat_travelers", json!({ "traveler_name": "Amy" }), &filter)
            .await
            .expect("update should succeed");
        assert_eq!(updated[0].get("traveler_name"), Some(&json!("Amy")));

        store
            .delete("boat_travelers", &filter)
            .await
            .expect("delete should succeed");
        assert_eq!(store.rows("boat_travelers").len(), 1);
    }

    #[tokio::test]
    async fn blob_urls_round_trip_and_removal_clears_paths() {
        let blobs = InMemoryBlobStore::new();
        blobs
            .upload("boat-attachments/1/5_a.png", vec![1])
            .await
            .expect("upload should succeed");

        let url = blobs.public_url("boat-attachments/1/5_a.png");
        assert_eq!(
            blobs.path_for_public_url(&url).as_deref(),
            Some("boat-attachments/1/5_a.png")
        );

        blobs
            .remove(&["boat-attachments/1/5_a.png".to_owned()])
            .await
            .expect("remove should succeed");
        assert!(!blobs.contains("boat-attachments/1/5_a.png"));
    }
}

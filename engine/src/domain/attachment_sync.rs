//! Attachment collection synchronizer.
//!
//! Reconciles one activity's persisted attachment rows (and their blobs)
//! with the form's desired list. Removals and additions each fan out; the
//! removal phase completes before any upload begins, so a mid-call crash
//! leaves either stale rows (recoverable by the next sync) or a partially
//! applied desired state (likewise). Nothing here is transactional.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::try_join_all;
use mockable::Clock;
use serde_json::Value;
use tracing::{debug, warn};

use super::SyncResult;
use super::activity::{ActivityId, ActivityKind};
use super::attachment::Attachment;
use super::diff::diff_children;
use super::error::SyncError;
use super::ports::{BlobStore, EqFilter, TableStore};
use super::transcode::{to_app_convention, to_store_convention};

/// Reconciles attachment rows and blobs for one activity at a time.
pub struct AttachmentSynchronizer<S, B> {
    store: Arc<S>,
    blobs: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<S, B> AttachmentSynchronizer<S, B> {
    /// Create a synchronizer over the given store and blob adapters.
    pub fn new(store: Arc<S>, blobs: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            blobs,
            clock,
        }
    }
}

impl<S, B> AttachmentSynchronizer<S, B>
where
    S: TableStore,
    B: BlobStore,
{
    /// Make the persisted attachment set for `parent_id` match `desired`.
    ///
    /// Returns only the newly inserted rows, transcoded to application
    /// convention with each in-memory payload reattached; the caller keeps
    /// its own copies of rows that survived the diff and drops removed keys
    /// from its cache. Re-submitting an already-persisted filename is a
    /// no-op, which is what makes repeated syncs converge without
    /// re-uploading.
    pub async fn sync(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
        desired: Vec<Attachment>,
    ) -> SyncResult<Vec<Attachment>> {
        let existing = self.existing_file_names(kind, parent_id).await?;
        let diff = diff_children(&existing, desired, |attachment: &Attachment| {
            attachment.file_name.clone()
        });
        debug!(
            kind = %kind,
            parent_id = %parent_id,
            additions = diff.to_add.len(),
            removals = diff.to_remove.len(),
            "attachment diff computed"
        );

        try_join_all(
            diff.to_remove
                .iter()
                .map(|file_name| self.remove_one(kind, parent_id, file_name)),
        )
        .await?;

        // Distinct natural keys can sanitize to the same storage name; an
        // occurrence counter keeps their same-batch paths distinct.
        let mut name_occurrences: HashMap<String, usize> = HashMap::new();
        let staged = try_join_all(diff.to_add.into_iter().map(|attachment| {
            let slot = name_occurrences
                .entry(sanitize_file_name(&attachment.file_name))
                .or_insert(0);
            let occurrence = *slot;
            *slot += 1;
            self.upload_one(kind, parent_id, attachment, occurrence)
        }))
        .await?;
        if staged.is_empty() {
            return Ok(Vec::new());
        }

        let (rows, payloads): (Vec<Value>, Vec<Option<Vec<u8>>>) = staged.into_iter().unzip();
        let inserted = self.store.insert(kind.attachments_table(), rows).await?;

        let mut payloads = payloads;
        let mut added = Vec::with_capacity(inserted.len());
        for (index, row) in inserted.into_iter().enumerate() {
            let mut attachment: Attachment = serde_json::from_value(to_app_convention(row))
                .map_err(|err| SyncError::row(format!("inserted attachment row: {err}")))?;
            // Payloads are reattached by upload order, which the bulk
            // insert preserves; the row itself never carries bytes.
            attachment.payload = payloads.get_mut(index).and_then(Option::take);
            added.push(attachment);
        }
        Ok(added)
    }

    /// Delete every attachment row and blob belonging to `parent_id`.
    ///
    /// Used by activity deletion, where blobs go first because the rows
    /// hold the only references to them.
    pub async fn remove_all(&self, kind: ActivityKind, parent_id: &ActivityId) -> SyncResult<()> {
        let rows = self
            .store
            .select(
                kind.attachments_table(),
                "id,file_name,file_url",
                &[parent_filter(parent_id)],
            )
            .await?;
        if rows.is_empty() {
            return Ok(());
        }

        let mut paths = Vec::with_capacity(rows.len());
        for row in &rows {
            match self.blob_path_of(row) {
                Some(path) => paths.push(path),
                None => {
                    let file_name = row.get("file_name").and_then(Value::as_str).unwrap_or("?");
                    warn!(file_name, "attachment row has no resolvable blob; deleting row only");
                }
            }
        }
        if !paths.is_empty() {
            self.blobs.remove(&paths).await?;
        }
        self.store
            .delete(kind.attachments_table(), &[parent_filter(parent_id)])
            .await?;
        Ok(())
    }

    async fn existing_file_names(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
    ) -> SyncResult<HashSet<String>> {
        let rows = self
            .store
            .select(
                kind.attachments_table(),
                "file_name",
                &[parent_filter(parent_id)],
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("file_name").and_then(Value::as_str))
            .map(str::to_owned)
            .collect())
    }

    /// Remove one persisted attachment: blob first, then the row, filtered
    /// by both row id and parent id. A missing blob URL is a warning, not
    /// an error; the row is deleted regardless.
    async fn remove_one(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
        file_name: &str,
    ) -> SyncResult<()> {
        let rows = self
            .store
            .select(
                kind.attachments_table(),
                "id,file_url",
                &[
                    parent_filter(parent_id),
                    EqFilter::new("file_name", file_name),
                ],
            )
            .await?;
        if rows.is_empty() {
            warn!(file_name, parent_id = %parent_id, "attachment to remove was already gone");
            return Ok(());
        }

        for row in rows {
            match self.blob_path_of(&row) {
                Some(path) => self.blobs.remove(&[path]).await?,
                None => {
                    warn!(file_name, "attachment row has no resolvable blob; deleting row only");
                }
            }
            let id = row_id(&row, "attachment")?;
            self.store
                .delete(
                    kind.attachments_table(),
                    &[EqFilter::new("id", id), parent_filter(parent_id)],
                )
                .await?;
        }
        Ok(())
    }

    /// Upload one new attachment and stage its store row.
    ///
    /// Returns the row in store convention paired with the payload that
    /// must be reattached after the bulk insert.
    async fn upload_one(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
        mut attachment: Attachment,
        occurrence: usize,
    ) -> SyncResult<(Value, Option<Vec<u8>>)> {
        let payload = attachment
            .payload
            .take()
            .ok_or_else(|| SyncError::MissingPayload {
                file_name: attachment.file_name.clone(),
            })?;

        let path = self.storage_path(kind, parent_id, &attachment.file_name, occurrence);
        self.blobs.upload(&path, payload.clone()).await?;
        let url = self.blobs.public_url(&path);

        let mut record = serde_json::to_value(&attachment)
            .map_err(|err| SyncError::row(format!("desired attachment: {err}")))?;
        if let Some(members) = record.as_object_mut() {
            members.insert("fileUrl".to_owned(), Value::String(url));
            members.insert(
                "activityId".to_owned(),
                Value::String(parent_id.as_str().to_owned()),
            );
        }
        Ok((to_store_convention(record), Some(payload)))
    }

    /// Collision-resistant storage path for a new blob.
    ///
    /// A non-zero `occurrence` marks a repeat of the same sanitized name
    /// within one upload batch, where the millisecond timestamp alone would
    /// produce identical paths.
    fn storage_path(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
        file_name: &str,
        occurrence: usize,
    ) -> String {
        let millis = self.clock.utc().timestamp_millis();
        let sanitized = sanitize_file_name(file_name);
        if occurrence == 0 {
            format!(
                "{}/{parent_id}/{millis}_{sanitized}",
                kind.attachment_path_prefix()
            )
        } else {
            format!(
                "{}/{parent_id}/{millis}-{occurrence}_{sanitized}",
                kind.attachment_path_prefix()
            )
        }
    }

    fn blob_path_of(&self, row: &Value) -> Option<String> {
        row.get("file_url")
            .and_then(Value::as_str)
            .and_then(|url| self.blobs.path_for_public_url(url))
    }
}

/// Filter child rows by their owning activity.
fn parent_filter(parent_id: &ActivityId) -> EqFilter {
    EqFilter::new("activity_id", parent_id.as_str())
}

/// Extract a row's primary key as the store returned it.
pub(crate) fn row_id(row: &Value, what: &str) -> SyncResult<Value> {
    row.get("id")
        .filter(|id| !id.is_null())
        .cloned()
        .ok_or_else(|| SyncError::row(format!("{what} row has no id")))
}

/// Replace every run of whitespace in a filename with one underscore.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
        } else {
            sanitized.push(ch);
            in_whitespace = false;
        }
    }
    sanitized
}

//! Parent upsert orchestration.
//!
//! Creates or updates the parent activity row, then reconciles both child
//! collections, then hands the caller a normalized record ready to merge
//! into its keyed-by-id cache. Create and update funnel through the same
//! diff machinery: create is simply the diff against an empty baseline.

use std::sync::Arc;

use mockable::Clock;
use serde_json::{Map, Value};

use super::SyncResult;
use super::activity::{ActivityId, ActivityKind};
use super::attachment::Attachment;
use super::attachment_sync::AttachmentSynchronizer;
use super::error::SyncError;
use super::participant::Participant;
use super::participant_sync::ParticipantSynchronizer;
use super::ports::{BlobStore, EqFilter, TableStore};
use super::transcode::{map_to_store_convention, to_app_convention};

/// A form submission to persist: parent fields plus desired child sets.
///
/// `fields` is the kind-specific field map in application convention
/// (camelCase, absent keys for absent values), including `tripId` and
/// `createdBy`. A present `id` selects the update path; `None` creates.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertActivity {
    /// Which activity kind is being written.
    pub kind: ActivityKind,
    /// Parent row identifier; `None` until the store has assigned one.
    pub id: Option<ActivityId>,
    /// Kind-specific parent fields in application convention.
    pub fields: Map<String, Value>,
    /// Attachment list the form wants persisted.
    pub attachments: Vec<Attachment>,
    /// Participant list the form wants persisted.
    pub participants: Vec<Participant>,
}

/// The record handed back for merging into the caller's in-memory cache.
///
/// Carries the transcoded parent fields as the store persisted them plus
/// the full child lists: rows that survived the diff and rows just added.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedActivity {
    /// Store-assigned parent identifier.
    pub id: ActivityId,
    /// The activity kind the record belongs to.
    pub kind: ActivityKind,
    /// Parent fields in application convention, as persisted.
    pub fields: Map<String, Value>,
    /// Full attachment list (kept plus newly added).
    pub attachments: Vec<Attachment>,
    /// Full participant list (kept plus newly added).
    pub participants: Vec<Participant>,
}

/// Orchestrates parent upserts and deletions across all activity kinds.
///
/// Holds no state between calls. Concurrent calls for different parent ids
/// are safe; concurrent calls for the same parent id race on the existing
/// snapshot and are not supported.
pub struct ActivitySyncService<S, B> {
    store: Arc<S>,
    attachments: AttachmentSynchronizer<S, B>,
    participants: ParticipantSynchronizer<S>,
}

impl<S, B> ActivitySyncService<S, B> {
    /// Wire the service to its store and blob adapters.
    pub fn new(store: Arc<S>, blobs: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            attachments: AttachmentSynchronizer::new(Arc::clone(&store), blobs, clock),
            participants: ParticipantSynchronizer::new(Arc::clone(&store)),
            store,
        }
    }
}

impl<S, B> ActivitySyncService<S, B>
where
    S: TableStore,
    B: BlobStore,
{
    /// Create or update one activity and reconcile its child collections.
    ///
    /// The parent write always completes before any child sync starts,
    /// because child rows need a durable parent id to reference. The two
    /// synchronizers then run concurrently, each fanning out internally.
    pub async fn upsert(&self, request: UpsertActivity) -> SyncResult<NormalizedActivity> {
        let UpsertActivity {
            kind,
            id,
            mut fields,
            attachments,
            participants,
        } = request;
        // The identifier travels in the request, never in the field map.
        fields.remove("id");

        let (parent_id, fields) = match id {
            None => self.create_parent(kind, fields).await?,
            Some(existing_id) => self.update_parent(kind, &existing_id, fields).await?,
        };

        let (added_attachments, participant_outcome) = futures_util::future::try_join(
            self.attachments.sync(kind, &parent_id, attachments.clone()),
            self.participants.sync(kind, &parent_id, participants.clone()),
        )
        .await?;

        Ok(NormalizedActivity {
            attachments: merge_children(attachments, added_attachments, |attachment| {
                attachment.file_name.clone()
            }),
            participants: merge_children(participants, participant_outcome.added, |participant| {
                participant.traveler_id
            }),
            id: parent_id,
            kind,
            fields,
        })
    }

    /// Delete one activity: child rows and blobs first, then the parent.
    ///
    /// The parent row must go last because its id is the foreign key every
    /// child deletion is filtered on.
    pub async fn delete(&self, kind: ActivityKind, parent_id: &ActivityId) -> SyncResult<()> {
        self.attachments.remove_all(kind, parent_id).await?;
        self.participants.remove_all(kind, parent_id).await?;
        self.store
            .delete(
                kind.parent_table(),
                &[EqFilter::new("id", parent_id.as_str())],
            )
            .await?;
        Ok(())
    }

    async fn create_parent(
        &self,
        kind: ActivityKind,
        fields: Map<String, Value>,
    ) -> SyncResult<(ActivityId, Map<String, Value>)> {
        let row = map_to_store_convention(fields);
        let inserted = self.store.insert(kind.parent_table(), vec![row]).await?;
        let row = inserted
            .into_iter()
            .next()
            .ok_or(SyncError::MissingParentRow {
                operation: "parent insert",
            })?;
        parent_from_row(row)
    }

    async fn update_parent(
        &self,
        kind: ActivityKind,
        id: &ActivityId,
        fields: Map<String, Value>,
    ) -> SyncResult<(ActivityId, Map<String, Value>)> {
        let patch = map_to_store_convention(fields);
        let updated = self
            .store
            .update(
                kind.parent_table(),
                patch,
                &[EqFilter::new("id", id.as_str())],
            )
            .await?;
        let row = updated
            .into_iter()
            .next()
            .ok_or(SyncError::MissingParentRow {
                operation: "parent update",
            })?;
        parent_from_row(row)
    }
}

/// Transcode a persisted parent row and pull out its identifier.
fn parent_from_row(row: Value) -> SyncResult<(ActivityId, Map<String, Value>)> {
    let Value::Object(fields) = to_app_convention(row) else {
        return Err(SyncError::row("parent row is not an object"));
    };
    let id = match fields.get("id") {
        Some(Value::String(id)) => ActivityId::new(id.clone()),
        Some(Value::Number(id)) => ActivityId::new(id.to_string()),
        _ => return Err(SyncError::row("parent row has no id")),
    };
    Ok((id, fields))
}

/// Compose the full child list: desired items that survived the diff plus
/// the freshly inserted rows.
fn merge_children<T, K, F>(desired: Vec<T>, added: Vec<T>, key_of: F) -> Vec<T>
where
    K: Eq + std::hash::Hash,
    F: Fn(&T) -> K,
{
    let added_keys: std::collections::HashSet<K> = added.iter().map(&key_of).collect();
    let mut merged: Vec<T> = desired
        .into_iter()
        .filter(|item| !added_keys.contains(&key_of(item)))
        .collect();
    merged.extend(added);
    merged
}

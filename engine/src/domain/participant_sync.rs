//! Participant collection synchronizer.
//!
//! Same reconciliation shape as attachments without the blob side effects:
//! diff by traveler id, fan-out row deletions, one bulk insert. Subject to
//! the same non-atomicity caveat: a failure mid-call leaves remote state
//! partially updated and the next sync converges again.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::Value;
use tracing::{debug, warn};

use super::SyncResult;
use super::activity::{ActivityId, ActivityKind, TravelerId};
use super::attachment_sync::row_id;
use super::diff::diff_children;
use super::error::SyncError;
use super::participant::Participant;
use super::ports::{EqFilter, TableStore};
use super::transcode::{to_app_convention, to_store_convention};

/// Result of one participant sync, for merging into the caller's cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSyncOutcome {
    /// Newly inserted participant rows, in application convention.
    pub added: Vec<Participant>,
    /// The activity the rows belong to.
    pub parent_id: ActivityId,
}

/// Reconciles participant rows for one activity at a time.
pub struct ParticipantSynchronizer<S> {
    store: Arc<S>,
}

impl<S> ParticipantSynchronizer<S> {
    /// Create a synchronizer over the given store adapter.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> ParticipantSynchronizer<S>
where
    S: TableStore,
{
    /// Make the persisted participant set for `parent_id` match `desired`.
    ///
    /// Rows whose traveler id survives the diff are untouched; removed ids
    /// have their rows deleted by id and parent id; added ids are bulk
    /// inserted with their denormalized display names.
    pub async fn sync(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
        desired: Vec<Participant>,
    ) -> SyncResult<ParticipantSyncOutcome> {
        let persisted = self.existing_rows(kind, parent_id).await?;
        let existing: HashSet<TravelerId> = persisted.keys().copied().collect();
        let diff = diff_children(&existing, desired, |participant: &Participant| {
            participant.traveler_id
        });
        debug!(
            kind = %kind,
            parent_id = %parent_id,
            additions = diff.to_add.len(),
            removals = diff.to_remove.len(),
            "participant diff computed"
        );

        try_join_all(diff.to_remove.iter().filter_map(|traveler_id| {
            persisted
                .get(traveler_id)
                .map(|id| self.remove_one(kind, parent_id, id.clone()))
        }))
        .await?;

        let added = if diff.to_add.is_empty() {
            Vec::new()
        } else {
            self.insert_added(kind, parent_id, diff.to_add).await?
        };

        Ok(ParticipantSyncOutcome {
            added,
            parent_id: parent_id.clone(),
        })
    }

    /// Delete every participant row belonging to `parent_id`.
    pub async fn remove_all(&self, kind: ActivityKind, parent_id: &ActivityId) -> SyncResult<()> {
        self.store
            .delete(kind.participants_table(), &[parent_filter(parent_id)])
            .await?;
        Ok(())
    }

    /// Persisted traveler ids mapped to their row primary keys.
    async fn existing_rows(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
    ) -> SyncResult<HashMap<TravelerId, Value>> {
        let rows = self
            .store
            .select(
                kind.participants_table(),
                "id,traveler_id",
                &[parent_filter(parent_id)],
            )
            .await?;

        let mut persisted = HashMap::with_capacity(rows.len());
        for row in rows {
            let Some(traveler_id) = row.get("traveler_id").and_then(Value::as_i64) else {
                warn!(parent_id = %parent_id, "participant row has no traveler id; skipping");
                continue;
            };
            persisted.insert(TravelerId::new(traveler_id), row_id(&row, "participant")?);
        }
        Ok(persisted)
    }

    async fn remove_one(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
        id: Value,
    ) -> SyncResult<()> {
        self.store
            .delete(
                kind.participants_table(),
                &[EqFilter::new("id", id), parent_filter(parent_id)],
            )
            .await?;
        Ok(())
    }

    async fn insert_added(
        &self,
        kind: ActivityKind,
        parent_id: &ActivityId,
        to_add: Vec<Participant>,
    ) -> SyncResult<Vec<Participant>> {
        let mut rows = Vec::with_capacity(to_add.len());
        for participant in &to_add {
            let mut record = serde_json::to_value(participant)
                .map_err(|err| SyncError::row(format!("desired participant: {err}")))?;
            if let Some(members) = record.as_object_mut() {
                members.insert(
                    "activityId".to_owned(),
                    Value::String(parent_id.as_str().to_owned()),
                );
            }
            rows.push(to_store_convention(record));
        }

        let inserted = self.store.insert(kind.participants_table(), rows).await?;
        inserted
            .into_iter()
            .map(|row| {
                serde_json::from_value(to_app_convention(row))
                    .map_err(|err| SyncError::row(format!("inserted participant row: {err}")))
            })
            .collect()
    }
}

/// Filter child rows by their owning activity.
fn parent_filter(parent_id: &ActivityId) -> EqFilter {
    EqFilter::new("activity_id", parent_id.as_str())
}

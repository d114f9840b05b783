//! Tests for the parent upsert orchestrator.

use std::sync::Arc;

use mockall::Sequence;
use mockable::MockClock;
use chrono::{TimeZone, Utc};
use serde_json::{Map, Value, json};

use super::activity::{ActivityId, ActivityKind, TravelerId};
use super::activity_service::{ActivitySyncService, UpsertActivity};
use super::error::SyncError;
use super::participant::Participant;
use super::ports::{MockBlobStore, MockTableStore};

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(members) => members,
        other => panic!("expected an object, got {other}"),
    }
}

fn service(
    store: MockTableStore,
    blobs: MockBlobStore,
) -> ActivitySyncService<MockTableStore, MockBlobStore> {
    let mut clock = MockClock::new();
    let instant = Utc
        .timestamp_millis_opt(1_750_000_000_000)
        .single()
        .expect("fixed timestamp is valid");
    clock.expect_utc().return_const(instant);
    ActivitySyncService::new(Arc::new(store), Arc::new(blobs), Arc::new(clock))
}

#[tokio::test]
async fn creating_a_boat_inserts_the_parent_before_the_children() {
    let mut store = MockTableStore::new();
    store
        .expect_insert()
        .withf(|table, rows| {
            table == "boats"
                && rows
                    == &vec![json!({
                        "boat_cruise_line": "SeaCo",
                        "trip_id": "trip-9",
                        "created_by": "user-1",
                    })]
        })
        .times(1)
        .return_once(|_, _| {
            Ok(vec![json!({
                "id": "act-1",
                "boat_cruise_line": "SeaCo",
                "trip_id": "trip-9",
                "created_by": "user-1",
                "notes": null,
            })])
        });
    store
        .expect_select()
        .withf(|table, _, _| table == "boat_attachments")
        .times(1)
        .return_once(|_, _, _| Ok(Vec::new()));
    store
        .expect_select()
        .withf(|table, _, _| table == "boat_travelers")
        .times(1)
        .return_once(|_, _, _| Ok(Vec::new()));
    store
        .expect_insert()
        .withf(|table, _| table == "boat_travelers")
        .times(1)
        .return_once(|_, _| {
            Ok(vec![json!({
                "id": "30",
                "traveler_id": 7,
                "traveler_name": "Amy",
                "activity_id": "act-1",
            })])
        });
    store.expect_delete().times(0);

    let record = service(store, MockBlobStore::new())
        .upsert(UpsertActivity {
            kind: ActivityKind::Boat,
            id: None,
            fields: fields(json!({
                "boatCruiseLine": "SeaCo",
                "tripId": "trip-9",
                "createdBy": "user-1",
            })),
            attachments: Vec::new(),
            participants: vec![Participant::new(TravelerId::new(7), "Amy")],
        })
        .await
        .expect("create should succeed");

    assert_eq!(record.id, ActivityId::new("act-1"));
    assert_eq!(record.kind, ActivityKind::Boat);
    assert_eq!(record.fields.get("boatCruiseLine"), Some(&json!("SeaCo")));
    assert!(
        !record.fields.contains_key("notes"),
        "null store fields must come back as absent keys"
    );
    assert!(record.attachments.is_empty());
    assert_eq!(record.participants.len(), 1);
    assert_eq!(record.participants[0].traveler_id, TravelerId::new(7));
    assert_eq!(record.participants[0].id.as_deref(), Some("30"));
}

#[tokio::test]
async fn updating_patches_the_parent_row_by_id() {
    let mut store = MockTableStore::new();
    store
        .expect_update()
        .withf(|table, patch, filters| {
            table == "boats"
                && patch.get("id").is_none()
                && patch.get("boat_cruise_line") == Some(&json!("WaveLine"))
                && filters.len() == 1
                && filters.iter().any(|f| f.column == "id" && f.value == json!("act-1"))
        })
        .times(1)
        .return_once(|_, _, _| {
            Ok(vec![json!({
                "id": "act-1",
                "boat_cruise_line": "WaveLine",
                "trip_id": "trip-9",
            })])
        });
    store
        .expect_select()
        .times(2)
        .returning(|_, _, _| Ok(Vec::new()));
    store.expect_insert().times(0);
    store.expect_delete().times(0);

    let record = service(store, MockBlobStore::new())
        .upsert(UpsertActivity {
            kind: ActivityKind::Boat,
            id: Some(ActivityId::new("act-1")),
            // An id smuggled into the field map must not reach the patch.
            fields: fields(json!({ "id": "act-1", "boatCruiseLine": "WaveLine" })),
            attachments: Vec::new(),
            participants: Vec::new(),
        })
        .await
        .expect("update should succeed");

    assert_eq!(record.fields.get("boatCruiseLine"), Some(&json!("WaveLine")));
}

#[tokio::test]
async fn updating_a_vanished_parent_is_an_error() {
    let mut store = MockTableStore::new();
    store
        .expect_update()
        .times(1)
        .return_once(|_, _, _| Ok(Vec::new()));

    let error = service(store, MockBlobStore::new())
        .upsert(UpsertActivity {
            kind: ActivityKind::Boat,
            id: Some(ActivityId::new("act-9")),
            fields: Map::new(),
            attachments: Vec::new(),
            participants: Vec::new(),
        })
        .await
        .expect_err("update of a missing parent must fail");

    assert!(matches!(error, SyncError::MissingParentRow { .. }));
}

#[tokio::test]
async fn kept_children_and_added_children_are_merged() {
    let mut store = MockTableStore::new();
    store
        .expect_update()
        .times(1)
        .return_once(|_, _, _| Ok(vec![json!({ "id": "act-1" })]));
    store
        .expect_select()
        .withf(|table, _, _| table == "boat_attachments")
        .times(1)
        .return_once(|_, _, _| Ok(Vec::new()));
    store
        .expect_select()
        .withf(|table, _, _| table == "boat_travelers")
        .times(1)
        .return_once(|_, _, _| Ok(vec![json!({ "id": "30", "traveler_id": 7 })]));
    store
        .expect_insert()
        .withf(|table, _| table == "boat_travelers")
        .times(1)
        .return_once(|_, _| {
            Ok(vec![json!({
                "id": "31",
                "traveler_id": 9,
                "traveler_name": "Ben",
                "activity_id": "act-1",
            })])
        });
    store.expect_delete().times(0);

    let record = service(store, MockBlobStore::new())
        .upsert(UpsertActivity {
            kind: ActivityKind::Boat,
            id: Some(ActivityId::new("act-1")),
            fields: Map::new(),
            attachments: Vec::new(),
            participants: vec![
                Participant::new(TravelerId::new(7), "Amy"),
                Participant::new(TravelerId::new(9), "Ben"),
            ],
        })
        .await
        .expect("update should succeed");

    let traveler_ids: Vec<i64> = record
        .participants
        .iter()
        .map(|participant| participant.traveler_id.value())
        .collect();
    assert_eq!(traveler_ids, vec![7, 9]);
    assert_eq!(
        record.participants[1].id.as_deref(),
        Some("31"),
        "the added row carries its store-assigned id"
    );
}

#[tokio::test]
async fn deletion_clears_children_before_the_parent_row() {
    let mut sequence = Sequence::new();
    let mut store = MockTableStore::new();
    store
        .expect_select()
        .withf(|table, _, _| table == "boat_attachments")
        .times(1)
        .return_once(|_, _, _| {
            Ok(vec![json!({
                "id": "10",
                "file_name": "a.png",
                "file_url": "https://blobs.test/boat-attachments/act-1/5_a.png",
            })])
        });
    store
        .expect_delete()
        .withf(|table, _| table == "boat_attachments")
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_, _| Ok(()));
    store
        .expect_delete()
        .withf(|table, _| table == "boat_travelers")
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_, _| Ok(()));
    store
        .expect_delete()
        .withf(|table, filters| {
            table == "boats"
                && filters.iter().any(|f| f.column == "id" && f.value == json!("act-1"))
        })
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_, _| Ok(()));

    let mut blobs = MockBlobStore::new();
    blobs
        .expect_path_for_public_url()
        .returning(|url| url.strip_prefix("https://blobs.test/").map(str::to_owned));
    blobs
        .expect_remove()
        .withf(|paths| paths == ["boat-attachments/act-1/5_a.png".to_owned()])
        .times(1)
        .return_once(|_| Ok(()));

    service(store, blobs)
        .delete(ActivityKind::Boat, &ActivityId::new("act-1"))
        .await
        .expect("delete should succeed");
}

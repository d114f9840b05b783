//! Participant child records.

use serde::{Deserialize, Serialize};

use super::activity::TravelerId;

/// A trip member taking part in one activity, in application convention.
///
/// The natural key is [`traveler_id`](Self::traveler_id), unique within the
/// owning activity. `traveler_name` is denormalized at insert time and is not
/// kept in sync when the member is renamed elsewhere; the planner accepts
/// that inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Row identifier, absent until the store has assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Trip member this participant row refers to.
    pub traveler_id: TravelerId,
    /// Display name cached at insert time.
    pub traveler_name: String,
}

impl Participant {
    /// Build a not-yet-persisted participant.
    pub fn new(traveler_id: TravelerId, traveler_name: impl Into<String>) -> Self {
        Self {
            id: None,
            traveler_id,
            traveler_name: traveler_name.into(),
        }
    }
}

//! Activity kinds and identifier newtypes.
//!
//! An activity is the parent record of the reconciliation engine: one row in
//! a kind-specific table, owning one attachment collection and one
//! participant collection. The engine never interprets the kind-specific
//! scalar fields; it only needs to know which tables and blob path prefix a
//! kind maps to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The ten activity kinds the planner supports.
///
/// Each kind knows the store tables holding its parent row and child rows,
/// plus the prefix under which its attachment blobs are stored. All other
/// engine code is kind-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
    /// Boat trips and cruises.
    Boat,
    /// Bus journeys.
    Bus,
    /// Flights.
    Flight,
    /// Celebrations (birthdays, anniversaries).
    Celebration,
    /// Scheduled events (concerts, exhibitions).
    Event,
    /// Vehicle and equipment rentals.
    Rental,
    /// Restaurant reservations.
    Restaurant,
    /// Walking routes.
    WalkingRoute,
    /// Overnight stays.
    Stay,
    /// Train journeys.
    Train,
}

impl ActivityKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Boat,
        Self::Bus,
        Self::Flight,
        Self::Celebration,
        Self::Event,
        Self::Rental,
        Self::Restaurant,
        Self::WalkingRoute,
        Self::Stay,
        Self::Train,
    ];

    /// Kebab-case name used by forms and blob path prefixes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boat => "boat",
            Self::Bus => "bus",
            Self::Flight => "flight",
            Self::Celebration => "celebration",
            Self::Event => "event",
            Self::Rental => "rental",
            Self::Restaurant => "restaurant",
            Self::WalkingRoute => "walking-route",
            Self::Stay => "stay",
            Self::Train => "train",
        }
    }

    /// Store table holding the parent rows for this kind.
    #[must_use]
    pub const fn parent_table(self) -> &'static str {
        match self {
            Self::Boat => "boats",
            Self::Bus => "buses",
            Self::Flight => "flights",
            Self::Celebration => "celebrations",
            Self::Event => "events",
            Self::Rental => "rentals",
            Self::Restaurant => "restaurants",
            Self::WalkingRoute => "walking_routes",
            Self::Stay => "stays",
            Self::Train => "trains",
        }
    }

    /// Store table holding this kind's attachment rows.
    #[must_use]
    pub const fn attachments_table(self) -> &'static str {
        match self {
            Self::Boat => "boat_attachments",
            Self::Bus => "bus_attachments",
            Self::Flight => "flight_attachments",
            Self::Celebration => "celebration_attachments",
            Self::Event => "event_attachments",
            Self::Rental => "rental_attachments",
            Self::Restaurant => "restaurant_attachments",
            Self::WalkingRoute => "walking_route_attachments",
            Self::Stay => "stay_attachments",
            Self::Train => "train_attachments",
        }
    }

    /// Store table holding this kind's participant rows.
    #[must_use]
    pub const fn participants_table(self) -> &'static str {
        match self {
            Self::Boat => "boat_travelers",
            Self::Bus => "bus_travelers",
            Self::Flight => "flight_travelers",
            Self::Celebration => "celebration_travelers",
            Self::Event => "event_travelers",
            Self::Rental => "rental_travelers",
            Self::Restaurant => "restaurant_travelers",
            Self::WalkingRoute => "walking_route_travelers",
            Self::Stay => "stay_travelers",
            Self::Train => "train_travelers",
        }
    }

    /// First segment of every blob path for this kind's attachments.
    ///
    /// Full paths take the shape
    /// `<prefix>/<parent id>/<epoch millis>_<sanitized filename>`.
    #[must_use]
    pub fn attachment_path_prefix(self) -> String {
        format!("{}-attachments", self.as_str())
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown activity kind name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown activity kind: {name}")]
pub struct ActivityKindParseError {
    /// The rejected kind name.
    pub name: String,
}

impl FromStr for ActivityKind {
    type Err = ActivityKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ActivityKindParseError {
                name: value.to_owned(),
            })
    }
}

/// Opaque parent row identifier, assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    /// Wrap a store-assigned identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of the trip an activity belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    /// Wrap a trip identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Reference to a trip member, the natural key of a participant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TravelerId(i64);

impl TravelerId {
    /// Wrap a trip member identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The underlying numeric identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TravelerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user who created a row or uploaded a blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a user identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for kind naming tables.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::boat(ActivityKind::Boat, "boat", "boats", "boat_attachments", "boat_travelers")]
    #[case::walking_route(
        ActivityKind::WalkingRoute,
        "walking-route",
        "walking_routes",
        "walking_route_attachments",
        "walking_route_travelers"
    )]
    #[case::stay(ActivityKind::Stay, "stay", "stays", "stay_attachments", "stay_travelers")]
    fn kind_names_map_to_expected_tables(
        #[case] kind: ActivityKind,
        #[case] name: &str,
        #[case] parent: &str,
        #[case] attachments: &str,
        #[case] participants: &str,
    ) {
        assert_eq!(kind.as_str(), name);
        assert_eq!(kind.parent_table(), parent);
        assert_eq!(kind.attachments_table(), attachments);
        assert_eq!(kind.participants_table(), participants);
        assert_eq!(kind.attachment_path_prefix(), format!("{name}-attachments"));
    }

    #[test]
    fn kinds_round_trip_through_from_str() {
        for kind in ActivityKind::ALL {
            let parsed: ActivityKind = kind.as_str().parse().expect("kind should parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let error = "submarine".parse::<ActivityKind>().expect_err("must fail");
        assert_eq!(error.name, "submarine");
    }

    #[test]
    fn kind_serializes_to_kebab_case() {
        let json = serde_json::to_string(&ActivityKind::WalkingRoute).expect("serialize");
        assert_eq!(json, "\"walking-route\"");
    }
}

//! Key-convention transcoding at the store/application boundary.
//!
//! The application speaks camelCase and models absent values as missing
//! keys; the store speaks snake_case and models them as `null`. These two
//! functions are the only place in the engine where either convention is
//! spelled out. Both are total and idempotent: transcoding an
//! already-transcoded value is a no-op, and unexpected key shapes pass
//! through unchanged.

use serde_json::{Map, Value};

/// Recursively convert a value from application to store convention.
///
/// Object keys become snake_case; arrays are converted element-wise;
/// scalars (including date strings) pass through untouched.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use tripsync::domain::to_store_convention;
///
/// let row = to_store_convention(json!({ "fileName": "a.png", "fileSize": 3 }));
/// assert_eq!(row, json!({ "file_name": "a.png", "file_size": 3 }));
/// ```
#[must_use]
pub fn to_store_convention(value: Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .map(|(key, member)| (camel_to_snake(&key), to_store_convention(member)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(to_store_convention).collect()),
        scalar => scalar,
    }
}

/// Recursively convert a value from store to application convention.
///
/// Object keys become camelCase and `null` members are dropped at every
/// depth: the store's absent-value marker becomes an absent key, which is
/// what lets later diffs skip optional fields entirely. `null` elements
/// inside arrays are kept so positions stay stable.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use tripsync::domain::to_app_convention;
///
/// let record = to_app_convention(json!({ "file_url": null, "file_name": "a.png" }));
/// assert_eq!(record, json!({ "fileName": "a.png" }));
/// ```
#[must_use]
pub fn to_app_convention(value: Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(key, member)| (snake_to_camel(&key), to_app_convention(member)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(to_app_convention).collect()),
        scalar => scalar,
    }
}

/// Transcode every member of a map to store convention.
#[must_use]
pub(crate) fn map_to_store_convention(fields: Map<String, Value>) -> Value {
    to_store_convention(Value::Object(fields))
}

fn camel_to_snake(key: &str) -> String {
    let mut converted = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            converted.push('_');
            converted.push(ch.to_ascii_lowercase());
        } else {
            converted.push(ch);
        }
    }
    converted
}

fn snake_to_camel(key: &str) -> String {
    let mut converted = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        // Only fold `_x` where x is a lowercase letter, so keys such as
        // `line_2` survive a round trip unchanged.
        let folded = ch == '_' && chars.peek().is_some_and(char::is_ascii_lowercase);
        if folded {
            if let Some(next) = chars.next() {
                converted.push(next.to_ascii_uppercase());
            }
        } else {
            converted.push(ch);
        }
    }
    converted
}

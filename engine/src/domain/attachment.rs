//! Attachment child records.

use serde::{Deserialize, Serialize};

use super::activity::UserId;

/// A file attached to one activity, in application convention.
///
/// The natural key is [`file_name`](Self::file_name), unique within the
/// owning activity (not globally). The in-memory shape and the persisted row
/// are intentionally asymmetric: `payload` carries the raw bytes only until
/// the blob is uploaded and is never part of a store row, which instead
/// carries the resolved `file_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Row identifier, absent until the store has assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Filename as submitted by the form; unique per activity.
    pub file_name: String,
    /// MIME type of the file.
    pub file_type: String,
    /// Size of the file in bytes.
    pub file_size: u64,
    /// Public blob URL, absent until the blob has been uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// User who uploaded the file.
    pub uploaded_by: UserId,
    /// In-memory binary payload, present only before upload.
    ///
    /// Never serialized: rows sent to the store must not carry raw bytes.
    #[serde(skip)]
    pub payload: Option<Vec<u8>>,
}

impl Attachment {
    /// Build a not-yet-persisted attachment carrying its upload payload.
    pub fn pending(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        uploaded_by: UserId,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id: None,
            file_name: file_name.into(),
            file_type: file_type.into(),
            file_size: payload.len() as u64,
            file_url: None,
            uploaded_by,
            payload: Some(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Serialisation contract checks for attachments.

    use super::*;

    #[test]
    fn payload_is_never_serialized() {
        let attachment = Attachment::pending(
            "itinerary.pdf",
            "application/pdf",
            UserId::new("user-1"),
            vec![1, 2, 3],
        );

        let value = serde_json::to_value(&attachment).expect("serialize");
        let object = value.as_object().expect("object");
        assert!(!object.contains_key("payload"));
        assert_eq!(object.get("fileName"), Some(&"itinerary.pdf".into()));
        assert_eq!(object.get("fileSize"), Some(&3.into()));
        assert!(!object.contains_key("id"), "absent id must be omitted");
        assert!(!object.contains_key("fileUrl"), "absent url must be omitted");
    }

    #[test]
    fn rows_deserialize_without_payload() {
        let attachment: Attachment = serde_json::from_value(serde_json::json!({
            "id": "42",
            "fileName": "a.png",
            "fileType": "image/png",
            "fileSize": 10,
            "fileUrl": "https://blobs.test/boat-attachments/1/0_a.png",
            "uploadedBy": "user-1",
        }))
        .expect("deserialize");

        assert_eq!(attachment.id.as_deref(), Some("42"));
        assert!(attachment.payload.is_none());
    }
}

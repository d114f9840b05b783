//! Reqwest-backed blob store adapter.
//!
//! Objects live in one bucket under the storage endpoint; public URLs are
//! minted by prefixing the storage path with the bucket's public root, so
//! translating a URL back into a path is a prefix strip.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::json;
use tracing::debug;

use super::RestAdapterError;
use super::table_store::{body_preview, parse_base_url};
use crate::domain::ports::{BlobStore, BlobStoreError};
use crate::outbound::config::StoreSettings;

/// Blob store adapter performing HTTP requests against one bucket.
pub struct RestBlobStore {
    client: Client,
    bucket_url: Url,
    public_prefix: String,
    api_key: String,
}

impl RestBlobStore {
    /// Build an adapter from settings, with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the base URL does not parse or the HTTP
    /// client cannot be constructed.
    pub fn new(settings: &StoreSettings) -> Result<Self, RestAdapterError> {
        let base = parse_base_url(&settings.base_url)?;
        let bucket = settings.blob_bucket();
        let bucket_url = base.join(&format!("storage/v1/object/{bucket}"))?;
        let public_prefix = format!("{base}storage/v1/object/public/{bucket}/");
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            client,
            bucket_url,
            public_prefix,
            api_key: settings.api_key.clone(),
        })
    }

    fn object_url(&self, path: &str) -> Result<Url, BlobStoreError> {
        Url::parse(&format!("{}/{path}", self.bucket_url))
            .map_err(|err| BlobStoreError::transport(format!("invalid object url: {err}")))
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), BlobStoreError> {
        let url = self.object_url(path)?;
        let response = self
            .client
            .post(url)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(self.api_key.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|err| BlobStoreError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|err| BlobStoreError::transport(err.to_string()))?;
            debug!(path, status = status.as_u16(), "blob upload rejected");
            return Err(BlobStoreError::upload(
                path,
                status_message(status, body.as_ref()),
            ));
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{path}", self.public_prefix)
    }

    fn path_for_public_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(self.public_prefix.as_str())
            .map(str::to_owned)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), BlobStoreError> {
        let response = self
            .client
            .delete(self.bucket_url.clone())
            .header("apikey", self.api_key.as_str())
            .bearer_auth(self.api_key.as_str())
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|err| BlobStoreError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|err| BlobStoreError::transport(err.to_string()))?;
            return Err(BlobStoreError::remove(status_message(status, body.as_ref())));
        }
        Ok(())
    }
}

fn status_message(status: StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    }
}

#[cfg(test)]
mod tests {
    //! Non-network coverage: URL minting and path recovery.

    use super::*;

    fn adapter() -> RestBlobStore {
        RestBlobStore::new(&StoreSettings {
            base_url: "https://store.test".to_owned(),
            api_key: "secret".to_owned(),
            blob_bucket: Some("trip-files".to_owned()),
            timeout_seconds: None,
        })
        .expect("adapter should build")
    }

    #[test]
    fn public_urls_round_trip_to_storage_paths() {
        let blobs = adapter();
        let path = "boat-attachments/act-1/1750000000000_deck_plan.png";

        let url = blobs.public_url(path);
        assert_eq!(
            url,
            "https://store.test/storage/v1/object/public/trip-files/\
             boat-attachments/act-1/1750000000000_deck_plan.png"
        );
        assert_eq!(blobs.path_for_public_url(&url).as_deref(), Some(path));
    }

    #[test]
    fn foreign_urls_do_not_resolve_to_paths() {
        let blobs = adapter();
        assert!(
            blobs
                .path_for_public_url("https://elsewhere.test/storage/v1/object/public/x/y.png")
                .is_none()
        );
    }

    #[test]
    fn object_urls_nest_the_path_under_the_bucket() {
        let blobs = adapter();
        let url = blobs
            .object_url("boat-attachments/act-1/5_a.png")
            .expect("object url should build");
        assert_eq!(
            url.as_str(),
            "https://store.test/storage/v1/object/trip-files/boat-attachments/act-1/5_a.png"
        );
    }
}

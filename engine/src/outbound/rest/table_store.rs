//! Reqwest-backed relational store adapter.
//!
//! Speaks a PostgREST-style dialect: one resource per table, equality
//! filters as `column=eq.value` query parameters, and
//! `Prefer: return=representation` to get affected rows back from writes.
//! The adapter owns transport details only; rows pass through untouched in
//! store convention.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use super::RestAdapterError;
use crate::domain::ports::{EqFilter, TableStore, TableStoreError};
use crate::outbound::config::StoreSettings;

/// Relational store adapter performing HTTP requests against one endpoint.
pub struct RestTableStore {
    client: Client,
    base: Url,
    api_key: String,
}

impl RestTableStore {
    /// Build an adapter from settings, with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the base URL does not parse or the HTTP
    /// client cannot be constructed.
    pub fn new(settings: &StoreSettings) -> Result<Self, RestAdapterError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            client,
            base,
            api_key: settings.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str, filters: &[EqFilter]) -> Result<Url, TableStoreError> {
        let mut url = self
            .base
            .join(&format!("rest/v1/{table}"))
            .map_err(|err| TableStoreError::query(format!("invalid table url: {err}")))?;
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for filter in filters {
                pairs.append_pair(
                    &filter.column,
                    &format!("eq.{}", render_filter_value(&filter.value)),
                );
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(self.api_key.as_str())
    }

    async fn rows_from(&self, request: RequestBuilder) -> Result<Vec<Value>, TableStoreError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref())
            .map_err(|err| TableStoreError::decode(format!("invalid row payload: {err}")))
    }
}

#[async_trait]
impl TableStore for RestTableStore {
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[EqFilter],
    ) -> Result<Vec<Value>, TableStoreError> {
        let mut url = self.table_url(table, filters)?;
        url.query_pairs_mut().append_pair("select", columns);
        self.rows_from(self.request(Method::GET, url)).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, TableStoreError> {
        let url = self.table_url(table, &[])?;
        self.rows_from(
            self.request(Method::POST, url)
                .header("Prefer", "return=representation")
                .json(&rows),
        )
        .await
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[EqFilter],
    ) -> Result<Vec<Value>, TableStoreError> {
        let url = self.table_url(table, filters)?;
        self.rows_from(
            self.request(Method::PATCH, url)
                .header("Prefer", "return=representation")
                .json(&patch),
        )
        .await
    }

    async fn delete(&self, table: &str, filters: &[EqFilter]) -> Result<(), TableStoreError> {
        let url = self.table_url(table, filters)?;
        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(map_transport_error)?;
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(())
    }
}

/// Normalise the base URL so joins append instead of replacing segments.
pub(super) fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let base = Url::parse(raw)?;
    if base.path().ends_with('/') {
        return Ok(base);
    }
    Url::parse(&format!("{base}/"))
}

/// Render a filter value the way the query dialect expects: bare strings,
/// JSON text for everything else.
fn render_filter_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn map_transport_error(error: reqwest::Error) -> TableStoreError {
    debug!(error = %error, "store request failed in transport");
    TableStoreError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> TableStoreError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    };
    if status.is_client_error() {
        TableStoreError::query(message)
    } else {
        TableStoreError::transport(message)
    }
}

pub(super) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

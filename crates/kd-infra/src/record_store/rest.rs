//! Hosted profile table over a PostgREST-style HTTP API.
//!
//! Upserts are `POST /rest/v1/<table>?on_conflict=id` with
//! `Prefer: resolution=merge-duplicates`, so absent columns keep their value.
//! Reads are `GET /rest/v1/<table>?id=eq.<id>&select=*`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use kd_core::onboarding::{ProfileRecord, ProfileRecordPatch};
use kd_core::ports::{ProfileRecordPort, RecordStoreError};
use kd_core::UserId;

const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub table: String,
    pub timeout: Duration,
}

pub struct RestProfileRecordStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RestProfileRecordStore {
    pub fn new(config: RestStoreConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;
        let endpoint = format!(
            "{}/rest/v1/{}",
            config.base_url.trim_end_matches('/'),
            config.table.trim_matches('/')
        );
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RecordStoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(classify_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, body))
    }
}

fn classify_transport_error(err: reqwest::Error) -> RecordStoreError {
    if err.is_timeout() {
        RecordStoreError::Timeout
    } else {
        RecordStoreError::Network(err.to_string())
    }
}

fn classify_status(status: StatusCode, body: String) -> RecordStoreError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RecordStoreError::Timeout,
        StatusCode::TOO_MANY_REQUESTS => RecordStoreError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RecordStoreError::Unauthorized(body),
        s if s.is_server_error() => RecordStoreError::Unavailable {
            status: s.as_u16(),
            message: body,
        },
        s => RecordStoreError::Rejected(format!("status {}: {body}", s.as_u16())),
    }
}

fn upsert_body(user_id: &UserId, patch: &ProfileRecordPatch) -> Result<Value, RecordStoreError> {
    let mut body = serde_json::to_value(patch)
        .map_err(|e| RecordStoreError::Rejected(format!("unserializable patch: {e}")))?;
    if let Value::Object(columns) = &mut body {
        columns.insert("id".to_string(), Value::String(user_id.to_string()));
    }
    Ok(body)
}

#[async_trait]
impl ProfileRecordPort for RestProfileRecordStore {
    async fn upsert(
        &self,
        user_id: &UserId,
        patch: &ProfileRecordPatch,
    ) -> Result<(), RecordStoreError> {
        let body = upsert_body(user_id, patch)?;
        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("on_conflict", "id")])
            .header("Prefer", UPSERT_PREFER)
            .json(&body);

        self.send(request).await.inspect_err(|err| {
            warn!(user_id = %user_id, error = %err, "profile upsert request failed");
        })?;
        debug!(user_id = %user_id, step = patch.onboarding_step, "profile upsert accepted");
        Ok(())
    }

    async fn fetch(&self, user_id: &UserId) -> Result<Option<ProfileRecord>, RecordStoreError> {
        let filter = format!("eq.{user_id}");
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("id", filter.as_str()), ("select", "*")]);

        let response = self.send(request).await?;
        let rows: Vec<ProfileRecord> = response
            .json()
            .await
            .map_err(|e| RecordStoreError::Corrupt(format!("unexpected profile payload: {e}")))?;
        Ok(rows.into_iter().next())
    }
}

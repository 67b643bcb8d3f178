//! Supabase (PostgREST) implementation of the remote store.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::config::ResolvedRemoteConfig;
use crate::models::{Record, RecordId};
use crate::util::compact_text;

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Row shape of the remote `records` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RecordRow {
    id: String,
    title: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
}

/// Columns written by an update; `deleted_at` is sent even when null so a
/// recovery clears it remotely.
#[derive(Debug, Serialize)]
struct RecordPatch<'a> {
    title: &'a str,
    completed: bool,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct SoftDeletePatch {
    deleted_at: DateTime<Utc>,
}

impl RecordRow {
    fn from_record(record: &Record) -> RemoteResult<Self> {
        Ok(Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            completed: record.completed,
            created_at: timestamp(record.created_at)?,
            updated_at: timestamp(record.updated_at())?,
            deleted_at: record.deleted_at().map(timestamp).transpose()?,
        })
    }

    fn into_record(self) -> RemoteResult<Record> {
        let id = self.id.parse::<RecordId>().map_err(|error| {
            RemoteError::InvalidPayload(format!("invalid record id '{}': {error}", self.id))
        })?;
        Ok(Record::from_remote(
            id,
            self.title,
            self.completed,
            self.created_at.timestamp_millis(),
            self.updated_at.timestamp_millis(),
            self.deleted_at.map(|deleted_at| deleted_at.timestamp_millis()),
        ))
    }
}

fn timestamp(ms: i64) -> RemoteResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| RemoteError::InvalidPayload(format!("timestamp {ms} is out of range")))
}

/// Remote store backed by a Supabase project's REST API.
#[derive(Clone)]
pub struct SupabaseRemoteStore {
    config: ResolvedRemoteConfig,
    client: Client,
}

impl SupabaseRemoteStore {
    pub fn new(config: ResolvedRemoteConfig) -> RemoteResult<Self> {
        if config.anon_key.trim().is_empty() {
            return Err(RemoteError::InvalidConfiguration(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            config,
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.config.table_url())
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.config.bearer_token())
            .header("Accept", "application/json")
    }

    async fn send_rows(&self, request: RequestBuilder) -> RemoteResult<Vec<RecordRow>> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<Vec<RecordRow>>().await?)
    }

    async fn send_single(&self, request: RequestBuilder, id: &RecordId) -> RemoteResult<Record> {
        self.send_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?
            .into_record()
    }
}

impl RemoteStore for SupabaseRemoteStore {
    async fn fetch_all(&self) -> RemoteResult<Vec<Record>> {
        let request = self.request(Method::GET).query(&[
            ("select", "*"),
            ("deleted_at", "is.null"),
            ("order", "created_at.desc"),
        ]);
        let rows = self.send_rows(request).await?;
        tracing::debug!("Fetched {} remote records", rows.len());
        rows.into_iter().map(RecordRow::into_record).collect()
    }

    async fn fetch_one(&self, id: &RecordId) -> RemoteResult<Option<Record>> {
        let request = self.request(Method::GET).query(&[
            ("select", "*".to_string()),
            ("id", format!("eq.{id}")),
            ("limit", "1".to_string()),
        ]);
        self.send_rows(request)
            .await?
            .into_iter()
            .next()
            .map(RecordRow::into_record)
            .transpose()
    }

    async fn create(&self, record: &Record) -> RemoteResult<Record> {
        // Merge on primary key so a retried create after a lost response is harmless.
        let request = self
            .request(Method::POST)
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .json(&RecordRow::from_record(record)?);
        self.send_single(request, &record.id).await
    }

    async fn update(&self, record: &Record) -> RemoteResult<Record> {
        let patch = RecordPatch {
            title: &record.title,
            completed: record.completed,
            updated_at: timestamp(record.updated_at())?,
            deleted_at: record.deleted_at().map(timestamp).transpose()?,
        };
        let request = self
            .request(Method::PATCH)
            .query(&[("id", format!("eq.{}", record.id))])
            .header("Prefer", "return=representation")
            .json(&patch);
        self.send_single(request, &record.id).await
    }

    async fn soft_delete(&self, id: &RecordId, deleted_at_ms: i64) -> RemoteResult<Record> {
        let patch = SoftDeletePatch {
            deleted_at: timestamp(deleted_at_ms)?,
        };
        let request = self
            .request(Method::PATCH)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);
        self.send_single(request, id).await
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorResponse {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    error: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorResponse>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            let detail = payload.details.or(payload.hint);
            return match detail {
                Some(detail) if !detail.trim().is_empty() => format!(
                    "{}: {} ({})",
                    message.trim(),
                    detail.trim(),
                    status.as_u16()
                ),
                _ => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

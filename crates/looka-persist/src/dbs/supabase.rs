use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PersistError, Result};
use crate::models::{ChatRecord, ChatUpdate, NewChat};
use crate::store::ChatStore;

pub const DEFAULT_TABLE: &str = "chats";

/// PostgREST error code for a table missing from the schema cache
const TABLE_MISSING_CODE: &str = "PGRST205";

const PLACEHOLDER_MARKERS: &[&str] = &["your_supabase_url", "your_supabase_anon_key", "your-project"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,
    /// Secret; only read from the environment
    #[serde(skip_serializing, default)]
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            table: default_table(),
        }
    }

    /// Missing or sample values are rejected before any request
    pub fn validate(&self) -> Result<()> {
        let is_placeholder =
            |value: &str| PLACEHOLDER_MARKERS.iter().any(|marker| value.contains(marker));

        if self.url.trim().is_empty() || is_placeholder(&self.url) {
            return Err(PersistError::Config("Supabase URL is missing or still a placeholder".to_string()));
        }
        if self.anon_key.trim().is_empty() || is_placeholder(&self.anon_key) {
            return Err(PersistError::Config("SUPABASE_ANON_KEY is missing or still a placeholder".to_string()));
        }
        if self.table.trim().is_empty() {
            return Err(PersistError::Config("table name is empty".to_string()));
        }
        Ok(())
    }
}

/// Chat store backed by a Supabase table through its PostgREST API
pub struct SupabaseStore {
    http_client: reqwest::Client,
    table_url: String,
    table: String,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("apikey", header_value(&config.anon_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", config.anon_key))?);

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            table_url: format!("{}/rest/v1/{}", config.url.trim_end_matches('/'), config.table),
            table: config.table.clone(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(self.classify_error(status.as_u16(), &body))
    }

    fn classify_error(&self, status: u16, body: &str) -> PersistError {
        let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();
        let code = parsed.as_ref().and_then(|e| e.code.clone());
        let message = parsed
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.trim().to_string());

        if code.as_deref() == Some(TABLE_MISSING_CODE) || message.contains("Could not find the table") {
            tracing::error!(table = %self.table, "Chats table missing from the database");
            return PersistError::TableMissing(self.table.clone());
        }

        tracing::warn!(status, code = ?code, %message, "Store request failed");
        PersistError::Api {
            status,
            code,
            message,
        }
    }

    async fn rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn eq_id(id: Uuid) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| PersistError::Config(format!("invalid header value: {}", e)))
}

#[async_trait]
impl ChatStore for SupabaseStore {
    async fn list_recent(&self, limit: usize) -> Result<Vec<ChatRecord>> {
        let request = self.http_client.get(&self.table_url).query(&[
            ("select", "*".to_string()),
            ("order", "updated_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);

        let records: Vec<ChatRecord> = self.rows(request).await?;
        tracing::debug!(count = records.len(), "Loaded chat history");
        Ok(records)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChatRecord>> {
        let request = self
            .http_client
            .get(&self.table_url)
            .query(&[("select", "*".to_string()), ("limit", "1".to_string())])
            .query(&Self::eq_id(id));

        let records: Vec<ChatRecord> = self.rows(request).await?;
        Ok(records.into_iter().next())
    }

    async fn create(&self, chat: NewChat) -> Result<ChatRecord> {
        let request = self
            .http_client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(&[chat]);

        let records: Vec<ChatRecord> = self.rows(request).await?;
        let record = records.into_iter().next().ok_or_else(|| PersistError::Api {
            status: 200,
            code: None,
            message: "insert returned no row".to_string(),
        })?;

        tracing::info!(chat_id = %record.id, "Chat created");
        Ok(record)
    }

    async fn update(&self, id: Uuid, update: ChatUpdate) -> Result<ChatRecord> {
        let request = self
            .http_client
            .patch(&self.table_url)
            .query(&Self::eq_id(id))
            .header("Prefer", "return=representation")
            .json(&update);

        let records: Vec<ChatRecord> = self.rows(request).await?;
        let record = records
            .into_iter()
            .next()
            .ok_or(PersistError::ChatNotFound(id))?;

        tracing::debug!(chat_id = %id, messages = record.messages.len(), "Chat updated");
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let request = self.http_client.delete(&self.table_url).query(&Self::eq_id(id));
        self.send(request).await?;

        tracing::info!(chat_id = %id, "Chat deleted");
        Ok(())
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let request = self
            .http_client
            .delete(&self.table_url)
            .query(&[(
                "created_at",
                format!("lt.{}", cutoff.to_rfc3339_opts(SecondsFormat::Millis, true)),
            )])
            .header("Prefer", "return=representation");

        let removed: Vec<serde_json::Value> = self.rows(request).await?;
        tracing::info!(removed = removed.len(), %cutoff, "Old chats cleaned up");
        Ok(removed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(SupabaseConfig::new("https://abc.supabase.co", "key").validate().is_ok());
        assert!(SupabaseConfig::new("", "key").validate().is_err());
        assert!(SupabaseConfig::new("your_supabase_url", "key").validate().is_err());
        assert!(SupabaseConfig::new("https://abc.supabase.co", "").validate().is_err());
        assert!(SupabaseStore::new(&SupabaseConfig::default()).is_err());
    }

    #[test]
    fn test_error_classification() {
        let store = SupabaseStore::new(&SupabaseConfig::new("http://localhost:1", "k")).unwrap();

        let missing = store.classify_error(
            404,
            r#"{"code":"PGRST205","message":"Could not find the table 'public.chats' in the schema cache"}"#,
        );
        assert!(missing.is_table_missing());

        match store.classify_error(401, r#"{"code":"42501","message":"permission denied"}"#) {
            PersistError::Api { status, code, message } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("42501"));
                assert_eq!(message, "permission denied");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_anon_key_not_serialized() {
        let json = serde_json::to_string(&SupabaseConfig::new("https://x.supabase.co", "secret")).unwrap();

        assert!(!json.contains("secret"));
    }
}

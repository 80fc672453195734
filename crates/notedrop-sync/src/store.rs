//! The remote notes store: trait seam and HTTP implementation.
//!
//! [`ApiStore`] talks to the notes API. The API handles idempotency itself:
//! posting a wire identifier it has already seen updates the existing note,
//! anything else creates a new one. The adapter's job is to get the request
//! there (retrying transient failures) and to hold the API to its response
//! contract.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use notedrop_models::{Record, RemoteNote, SaveOutcome, SaveResult};

use crate::error::{Result, SyncError};
use crate::retry::{run_with_retry, RetryConfig};

/// Default per-attempt request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Interface to a note storage backend.
///
/// Different bots can persist to different backends through this seam; the
/// offline buffer and the availability monitor only ever see the trait.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Saves or updates a note, keyed by the record's wire identifier.
    async fn save_note(&self, record: &Record) -> Result<SaveResult>;

    /// Fetches the most recent notes, newest first.
    ///
    /// Also doubles as the liveness probe with a limit of 1.
    async fn fetch_notes(&self, limit: usize) -> Result<Vec<RemoteNote>>;
}

/// Configuration for [`ApiStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the notes API, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Bearer token for authentication.
    pub api_token: String,
    /// Per-attempt request timeout.
    pub request_timeout: Duration,
    /// Retry behavior for saves.
    pub retry: RetryConfig,
}

impl StoreConfig {
    /// Creates a config with the default timeout and retry settings.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

/// HTTP client for the notes API.
pub struct ApiStore {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    retry: RetryConfig,
}

impl ApiStore {
    /// Builds the store from its configuration.
    ///
    /// The per-attempt timeout is enforced by the underlying HTTP client, so
    /// a hung request surfaces as a transient timeout error.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token,
            retry: config.retry,
        })
    }
}

#[async_trait]
impl NoteStore for ApiStore {
    async fn save_note(&self, record: &Record) -> Result<SaveResult> {
        let wire_id = record.wire_id();
        // created_at/updated_at are managed server-side and stay out of the
        // payload.
        let payload = serde_json::json!({
            "message_id": wire_id,
            "text": record.content,
        });
        let endpoint = format!("{}/notes", self.base_url);

        let result = run_with_retry(&self.retry, || {
            let request = self
                .client
                .post(&endpoint)
                .bearer_auth(&self.api_token)
                .json(&payload);
            let wire_id = wire_id.clone();

            async move {
                let response = request.send().await?;
                if let Some(err) = SyncError::from_status(response.status().as_u16()) {
                    return Err(err);
                }
                let body: Value = response.json().await?;
                parse_save_response(&body, &wire_id)
            }
        })
        .await?;

        debug!(
            message_id = %result.message_id,
            note_id = %result.note_id,
            outcome = ?result.outcome,
            "note saved"
        );
        Ok(result)
    }

    async fn fetch_notes(&self, limit: usize) -> Result<Vec<RemoteNote>> {
        let endpoint = format!("{}/notes?limit={}", self.base_url, limit);
        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if let Some(err) = SyncError::from_status(response.status().as_u16()) {
            return Err(err);
        }

        let notes: Vec<RemoteNote> = response.json().await?;
        debug!(count = notes.len(), "fetched remote notes");
        Ok(notes)
    }
}

/// Validates a save response body against the API contract.
///
/// A 2xx response missing the status or note id is a contract violation, not
/// a transport failure: it is fatal and never retried.
fn parse_save_response(body: &Value, wire_id: &str) -> Result<SaveResult> {
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::MalformedResponse("missing status field".to_string()))?;

    let outcome = SaveOutcome::from_wire(status).ok_or_else(|| {
        SyncError::MalformedResponse(format!("unknown save status {status:?}"))
    })?;

    let note_id = match body.get("note_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(SyncError::MalformedResponse(
                "missing note_id field".to_string(),
            ))
        }
    };

    Ok(SaveResult {
        outcome,
        note_id,
        message_id: wire_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notedrop_models::SaveOutcome;

    #[test]
    fn test_parse_created_response() {
        let body = serde_json::json!({"status": "created", "note_id": "n-17"});
        let result = parse_save_response(&body, "42_1001").unwrap();
        assert_eq!(result.outcome, SaveOutcome::Created);
        assert_eq!(result.note_id, "n-17");
        assert_eq!(result.message_id, "42_1001");
    }

    #[test]
    fn test_parse_updated_response_with_numeric_id() {
        let body = serde_json::json!({"status": "updated", "note_id": 17});
        let result = parse_save_response(&body, "42_1001").unwrap();
        assert_eq!(result.outcome, SaveOutcome::Updated);
        assert_eq!(result.note_id, "17");
    }

    #[test]
    fn test_missing_status_is_malformed() {
        let body = serde_json::json!({"note_id": "n-17"});
        let err = parse_save_response(&body, "42_1001").unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_missing_note_id_is_malformed() {
        let body = serde_json::json!({"status": "created"});
        let err = parse_save_response(&body, "42_1001").unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse(_)));
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let body = serde_json::json!({"status": "archived", "note_id": "n-17"});
        let err = parse_save_response(&body, "42_1001").unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse(_)));
    }

    #[test]
    fn test_store_config_trims_trailing_slash() {
        let store = ApiStore::new(StoreConfig::new("https://api.example.com/", "token")).unwrap();
        assert_eq!(store.base_url, "https://api.example.com");
    }
}

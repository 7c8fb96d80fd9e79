//! Weaviate Note Store
//!
//! REST client for the `Note` collection. Writes go through `/v1/objects`,
//! hybrid search through the GraphQL `Get` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::NoteStore;
use crate::error::{NoteStoreError, Result};
use crate::model::{NewNote, NoteId, NoteRecord, NOTE_COLLECTION};

/// Weaviate connection configuration
#[derive(Clone, Debug)]
pub struct WeaviateConfig {
    /// Base URL of the Weaviate instance
    pub url: String,

    /// Optional API key sent as a bearer token
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".into(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl WeaviateConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("WEAVIATE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.url),
            api_key: std::env::var("WEAVIATE_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_secs: std::env::var("WEAVIATE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Weaviate-backed note store.
///
/// Holds one pooled HTTP client for its whole lifetime; every handler call
/// borrows a connection from that pool instead of reconnecting.
pub struct WeaviateStore {
    client: reqwest::Client,
    config: WeaviateConfig,
}

impl WeaviateStore {
    pub fn new(config: WeaviateConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NoteStoreError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(WeaviateConfig::from_env())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.config.url, path));
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| NoteStoreError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NoteStoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Drop the `Note` collection if it exists and create it again with the
    /// `content`, `context` and `createdAt` properties.
    pub async fn reset_collection(&self) -> Result<()> {
        let path = format!("/v1/schema/{}", NOTE_COLLECTION);
        let existing = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|e| NoteStoreError::Unreachable(e.to_string()))?;

        if existing.status().is_success() {
            tracing::info!(collection = NOTE_COLLECTION, "Deleting existing collection");
            self.send(self.request(reqwest::Method::DELETE, &path)).await?;
        }

        self.send(
            self.request(reqwest::Method::POST, "/v1/schema")
                .json(&collection_schema()),
        )
        .await?;

        tracing::info!(collection = NOTE_COLLECTION, "Created collection");
        Ok(())
    }
}

fn collection_schema() -> serde_json::Value {
    json!({
        "class": NOTE_COLLECTION,
        "properties": [
            { "name": "content", "dataType": ["text"] },
            { "name": "context", "dataType": ["text"] },
            { "name": "createdAt", "dataType": ["date"] },
        ]
    })
}

fn hybrid_query(query: &str, limit: usize) -> serde_json::Value {
    // A JSON string literal is also a valid GraphQL string literal
    let quoted = serde_json::Value::String(query.to_string()).to_string();
    json!({
        "query": format!(
            "{{ Get {{ {}(hybrid: {{ query: {} }}, limit: {}) {{ content context createdAt _additional {{ id }} }} }} }}",
            NOTE_COLLECTION, quoted, limit
        )
    })
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlNote {
    #[serde(default)]
    content: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "_additional")]
    additional: Additional,
}

#[derive(Debug, Deserialize)]
struct Additional {
    id: String,
}

fn parse_search_response(response: GraphQlResponse) -> Result<Vec<NoteRecord>> {
    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(NoteStoreError::Rejected { status: 200, message });
    }

    let notes = response
        .data
        .as_ref()
        .and_then(|d| d.get("Get"))
        .and_then(|g| g.get(NOTE_COLLECTION))
        .cloned()
        .ok_or_else(|| NoteStoreError::Malformed("missing Get.Note in response".into()))?;

    let notes: Vec<GraphQlNote> = serde_json::from_value(notes)?;

    Ok(notes
        .into_iter()
        .map(|n| NoteRecord {
            id: n.additional.id,
            content: n.content,
            context: n.context,
            created_at: n.created_at,
        })
        .collect())
}

#[async_trait]
impl NoteStore for WeaviateStore {
    async fn insert(&self, note: NewNote) -> Result<NoteId> {
        let body = json!({
            "class": NOTE_COLLECTION,
            "properties": note,
        });

        let response = self
            .send(self.request(reqwest::Method::POST, "/v1/objects").json(&body))
            .await?;

        let created: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NoteStoreError::Malformed(e.to_string()))?;

        let id = created["id"]
            .as_str()
            .ok_or_else(|| NoteStoreError::Malformed("object without id".into()))?
            .to_string();

        tracing::debug!(note_id = %id, "Inserted note");
        Ok(id)
    }

    async fn hybrid_search(&self, query: &str, limit: usize) -> Result<Vec<NoteRecord>> {
        let response = self
            .send(
                self.request(reqwest::Method::POST, "/v1/graphql")
                    .json(&hybrid_query(query, limit)),
            )
            .await?;

        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| NoteStoreError::Malformed(e.to_string()))?;

        let notes = parse_search_response(parsed)?;
        tracing::debug!(query, hits = notes.len(), "Hybrid search");
        Ok(notes)
    }

    async fn health_check(&self) -> bool {
        match self
            .request(reqwest::Method::GET, "/v1/.well-known/ready")
            .send()
            .await
        {
            Ok(r) => r.status().is_success(),
            Err(e) => {
                tracing::warn!("Weaviate health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        "Weaviate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = WeaviateConfig::default();
        assert_eq!(config.url, "http://localhost:8080");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn hybrid_query_quotes_user_text() {
        let body = hybrid_query(r#"say "hi""#, 5);
        let query = body["query"].as_str().unwrap();
        assert!(query.contains(r#"hybrid: { query: "say \"hi\"" }"#));
        assert!(query.contains("limit: 5"));
        assert!(query.contains("_additional { id }"));
    }

    #[test]
    fn schema_has_note_properties() {
        let schema = collection_schema();
        assert_eq!(schema["class"], "Note");
        let names: Vec<&str> = schema["properties"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["content", "context", "createdAt"]);
    }

    #[test]
    fn parses_search_hits_in_rank_order() {
        let raw = json!({
            "data": { "Get": { "Note": [
                {
                    "content": "Tips for writing effective blog posts",
                    "context": "User wants to improve their blog writing skills",
                    "createdAt": "2024-05-01T10:00:00Z",
                    "_additional": { "id": "8f1c2f5e-0000-4000-8000-000000000001" }
                },
                {
                    "content": "Second",
                    "context": "ctx",
                    "createdAt": null,
                    "_additional": { "id": "8f1c2f5e-0000-4000-8000-000000000002" }
                }
            ] } }
        });
        let response: GraphQlResponse = serde_json::from_value(raw).unwrap();
        let notes = parse_search_response(response).unwrap();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, "8f1c2f5e-0000-4000-8000-000000000001");
        assert!(notes[0].created_at.is_some());
        assert!(notes[1].created_at.is_none());
    }

    #[test]
    fn graphql_errors_are_rejections() {
        let raw = json!({ "errors": [ { "message": "class Note not found" } ] });
        let response: GraphQlResponse = serde_json::from_value(raw).unwrap();
        let err = parse_search_response(response).unwrap_err();
        assert!(matches!(err, NoteStoreError::Rejected { .. }));
    }

    #[tokio::test]
    async fn unreachable_store_reports_error() {
        let store = WeaviateStore::new(WeaviateConfig {
            url: "http://127.0.0.1:1".into(),
            api_key: None,
            timeout_secs: 2,
        })
        .unwrap();

        let err = store.insert(NewNote::now("c", "x")).await.unwrap_err();
        assert!(matches!(err, NoteStoreError::Unreachable(_)));
        assert!(!store.health_check().await);
    }
}

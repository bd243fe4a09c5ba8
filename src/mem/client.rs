// src/mem/client.rs
//! HTTP client for the Mem notes/collections API.
//!
//! Every call attaches the configured credential (`Bearer` for the v1 API,
//! `ApiAccessToken` for the legacy v0 scheme) and goes out exactly once —
//! retries and backoff belong to the caller, not this layer. Non-2xx and
//! non-JSON responses surface as typed errors so tool handlers can render
//! them without guessing.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{Value, json};

use crate::config::Config;

/// Bounded per-call timeout. The Mem API answers in well under a second;
/// anything past this is a stuck connection, not a slow query.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Max bytes of an upstream body echoed into error messages.
const ERROR_BODY_LIMIT: usize = 500;

// ── Auth scheme generations ─────────────────────────────────────────────────

/// Which Mem API generation the credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGeneration {
    /// Legacy API — `Authorization: ApiAccessToken <key>`.
    V0,
    /// Current API — `Authorization: Bearer <key>`.
    V1,
}

// ── Error taxonomy ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum MemApiError {
    #[error("MEM_API_KEY is not configured")]
    MissingCredential,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} {status_text}: {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("response is not valid JSON: {raw}")]
    Format { raw: String },
}

// ── Client ──────────────────────────────────────────────────────────────────

/// Thin client over the Mem REST API. Cheap to clone — the inner
/// `reqwest::Client` is an Arc-backed connection pool shared process-wide.
#[derive(Debug, Clone)]
pub struct MemClient {
    http: Client,
    base_url: String,
    credential: Option<String>,
    generation: ApiGeneration,
}

impl MemClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.api_url.clone(),
            credential: config.api_key.clone(),
            generation: config.generation,
        }
    }

    /// Issue a single request against the Mem API.
    ///
    /// Empty 2xx bodies parse as `{}` — several write endpoints answer with
    /// no content on success.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, MemApiError> {
        let key = self
            .credential
            .as_deref()
            .ok_or(MemApiError::MissingCredential)?;

        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .timeout(CALL_TIMEOUT)
            .header(AUTHORIZATION, self.auth_header_value(key));

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(b) = body {
            req = req.header(CONTENT_TYPE, "application/json").json(b);
        }

        tracing::debug!("mem: {} {}", method, url);
        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(MemApiError::Http {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
                body: truncate_str(&text, ERROR_BODY_LIMIT),
            });
        }

        if text.trim().is_empty() {
            return Ok(json!({}));
        }

        serde_json::from_str(&text).map_err(|_| MemApiError::Format {
            raw: truncate_str(&text, ERROR_BODY_LIMIT),
        })
    }

    fn auth_header_value(&self, key: &str) -> String {
        match self.generation {
            ApiGeneration::V0 => format!("ApiAccessToken {key}"),
            ApiGeneration::V1 => format!("Bearer {key}"),
        }
    }

    // ── Endpoint wrappers (the Mem API's fixed contract) ────────────────

    pub async fn search_notes(
        &self,
        query: &str,
        limit: Option<i64>,
    ) -> Result<Value, MemApiError> {
        let body = search_body(query, limit);
        self.call(Method::POST, "/v1/notes/search", &[], Some(&body))
            .await
    }

    pub async fn list_notes(
        &self,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<Value, MemApiError> {
        let query = page_query(limit, cursor);
        self.call(Method::GET, "/v1/notes", &query, None).await
    }

    pub async fn create_note(
        &self,
        content: &str,
        title: Option<&str>,
        collection_ids: Option<&[String]>,
    ) -> Result<Value, MemApiError> {
        let body = create_note_body(content, title, collection_ids);
        self.call(Method::POST, "/v1/notes", &[], Some(&body)).await
    }

    pub async fn get_note(&self, note_id: &str) -> Result<Value, MemApiError> {
        let path = format!("/v1/notes/{note_id}");
        self.call(Method::GET, &path, &[], None).await
    }

    pub async fn mem_it(
        &self,
        input: &str,
        instructions: Option<&str>,
    ) -> Result<Value, MemApiError> {
        let body = mem_it_body(input, instructions);
        self.call(Method::POST, "/v1/mem-it", &[], Some(&body)).await
    }

    pub async fn list_collections(
        &self,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<Value, MemApiError> {
        let query = page_query(limit, cursor);
        self.call(Method::GET, "/v1/collections", &query, None).await
    }

    pub async fn search_collections(
        &self,
        query: &str,
        limit: Option<i64>,
    ) -> Result<Value, MemApiError> {
        let body = search_body(query, limit);
        self.call(Method::POST, "/v1/collections/search", &[], Some(&body))
            .await
    }
}

// ── Request body / query builders ───────────────────────────────────────────
// Unset optional fields are omitted entirely — the Mem API rejects nulls and
// treats empty arrays as "clear", which is never what a caller means here.

fn search_body(query: &str, limit: Option<i64>) -> Value {
    let mut body = json!({ "query": query });
    if let Some(n) = limit {
        body["limit"] = json!(n);
    }
    body
}

fn create_note_body(content: &str, title: Option<&str>, collection_ids: Option<&[String]>) -> Value {
    let mut body = json!({ "content": content });
    if let Some(t) = title {
        body["title"] = json!(t);
    }
    if let Some(ids) = collection_ids {
        body["collection_ids"] = json!(ids);
    }
    body
}

fn mem_it_body(input: &str, instructions: Option<&str>) -> Value {
    let mut body = json!({ "input": input });
    if let Some(i) = instructions {
        body["instructions"] = json!(i);
    }
    body
}

fn page_query(limit: Option<i64>, cursor: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(n) = limit {
        query.push(("limit", n.to_string()));
    }
    if let Some(c) = cursor {
        query.push(("cursor", c.to_string()));
    }
    query
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let boundary = s
            .char_indices()
            .take_while(|(i, _)| *i < max_len)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(max_len);
        format!("{}...", &s[..boundary])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_omits_unset_limit() {
        let body = search_body("budget", None);
        assert_eq!(body, json!({ "query": "budget" }));
        assert!(body.get("limit").is_none());
    }

    #[test]
    fn search_body_includes_limit_when_set() {
        let body = search_body("budget", Some(5));
        assert_eq!(body["limit"], 5);
    }

    #[test]
    fn create_note_body_omits_unset_optionals() {
        let body = create_note_body("hello", None, None);
        assert_eq!(body, json!({ "content": "hello" }));
        assert!(body.get("title").is_none());
        assert!(body.get("collection_ids").is_none());
    }

    #[test]
    fn create_note_body_includes_set_optionals() {
        let ids = vec!["c1".to_string(), "c2".to_string()];
        let body = create_note_body("hello", Some("Plans"), Some(&ids));
        assert_eq!(body["title"], "Plans");
        assert_eq!(body["collection_ids"], json!(["c1", "c2"]));
    }

    #[test]
    fn mem_it_body_omits_unset_instructions() {
        assert_eq!(mem_it_body("raw text", None), json!({ "input": "raw text" }));
    }

    #[test]
    fn page_query_skips_unset_fields() {
        assert!(page_query(None, None).is_empty());
        let q = page_query(Some(20), Some("abc"));
        assert_eq!(q, vec![("limit", "20".to_string()), ("cursor", "abc".to_string())]);
    }

    #[test]
    fn auth_header_matches_generation() {
        let config = Config {
            api_key: Some("k123".to_string()),
            api_url: "https://api.mem.ai".to_string(),
            generation: ApiGeneration::V1,
            port: 8080,
            allowed_origins: None,
        };
        let v1 = MemClient::new(Client::new(), &config);
        assert_eq!(v1.auth_header_value("k123"), "Bearer k123");

        let legacy = MemClient::new(
            Client::new(),
            &Config {
                generation: ApiGeneration::V0,
                ..config
            },
        );
        assert_eq!(legacy.auth_header_value("k123"), "ApiAccessToken k123");
    }

    #[test]
    fn truncate_str_is_noop_below_limit() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 5), "hello...");
    }

    #[tokio::test]
    async fn call_without_credential_fails_fast() {
        let config = Config {
            api_key: None,
            api_url: "https://api.mem.ai".to_string(),
            generation: ApiGeneration::V1,
            port: 8080,
            allowed_origins: None,
        };
        let client = MemClient::new(Client::new(), &config);
        let err = client
            .call(Method::GET, "/v1/notes", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, MemApiError::MissingCredential));
    }
}

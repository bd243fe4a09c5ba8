// src/mcp/streamable.rs
//! Streamable HTTP transport — one `/mcp` endpoint, all methods.
//!
//! Session state machine:
//! - `initialize` always mints a fresh session, even when the request carries
//!   a stale id — that is the one sanctioned recreation path. The new id goes
//!   back in the `Mcp-Session-Id` response header.
//! - Any other request must name a live session. Unknown id: 404. Missing
//!   id: 400. Neither ever falls through to creating a session, otherwise a
//!   client that lost its session would silently lose conversation state too.
//! - `DELETE` terminates and is idempotent: 204 whether or not the id was
//!   still live.
//!
//! Requests within one session are serialized by the handler mutex (acquired
//! in arrival order); different sessions never contend.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::state::AppState;

use super::protocol::{McpHandler, is_initialize, json_rpc_error};

/// Header correlating streamable-transport requests to a session.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Store entry for one streamable session. The mutex is the per-session
/// serialization point.
pub struct StreamableSession {
    pub handler: Mutex<McpHandler>,
}

/// Entry point for every method on `/mcp`.
pub async fn mcp_endpoint(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match method {
        Method::POST => handle_post(state, headers, body).await,
        Method::DELETE => handle_delete(state, headers).await,
        other => {
            ApiError::MethodNotAllowed(format!("{other} is not supported on /mcp")).into_response()
        }
    }
}

fn session_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

async fn handle_post(state: AppState, headers: HeaderMap, body: Bytes) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json_rpc_error(
                    Value::Null,
                    -32700,
                    &format!("Invalid JSON: {e}"),
                )),
            )
                .into_response();
        }
    };

    if is_initialize(&message) {
        let session_id = Uuid::new_v4().to_string();
        let handler = McpHandler::new(state.mem_client(), session_id.clone());
        let session = state
            .streamable_sessions
            .insert(
                session_id.clone(),
                StreamableSession {
                    handler: Mutex::new(handler),
                },
            )
            .await;
        tracing::info!(session_id = %session_id, "mcp: streamable session initialized");

        let response = {
            let handler = session.inner.handler.lock().await;
            handler.handle(&message).await
        };

        let mut response = match response {
            Some(v) => (StatusCode::OK, Json(v)).into_response(),
            None => StatusCode::ACCEPTED.into_response(),
        };
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            response.headers_mut().insert(MCP_SESSION_ID_HEADER, value);
        }
        return response;
    }

    let Some(session_id) = session_header(&headers) else {
        return ApiError::BadRequest("Missing Mcp-Session-Id header".to_string()).into_response();
    };

    let Some(session) = state.streamable_sessions.get(&session_id).await else {
        return ApiError::NotFound(format!("Session not found: {session_id}")).into_response();
    };

    let response = {
        let handler = session.inner.handler.lock().await;
        handler.handle(&message).await
    };

    match response {
        Some(v) => (StatusCode::OK, Json(v)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_delete(state: AppState, headers: HeaderMap) -> Response {
    let Some(session_id) = session_header(&headers) else {
        return ApiError::BadRequest("Missing Mcp-Session-Id header".to_string()).into_response();
    };

    if state.streamable_sessions.remove(&session_id).await {
        tracing::info!(session_id = %session_id, "mcp: streamable session terminated");
    }
    StatusCode::NO_CONTENT.into_response()
}

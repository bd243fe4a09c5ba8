// src/mcp/sse.rs
//! Legacy HTTP+SSE transport — long-lived `GET /sse` stream plus a
//! short-lived `POST /messages` write path.
//!
//! The handshake happens in-band: the first SSE event (`event: endpoint`)
//! tells the client where to post, with the session id baked into the query
//! string. JSON-RPC responses travel back over the stream as `message`
//! events; the POST itself only acknowledges receipt.
//!
//! There is no idle reaper here — liveness is the connection itself. A drop
//! guard inside the stream removes the store entry the moment the client
//! disconnects.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::Stream;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::state::AppState;

use super::protocol::McpHandler;
use super::session::SessionStore;

/// Store entry for one SSE session: the serialized handler plus the sending
/// half of the event channel feeding the open stream.
pub struct SseSession {
    pub handler: Mutex<McpHandler>,
    pub tx: mpsc::UnboundedSender<Event>,
}

// ── GET /sse — open the stream ──────────────────────────────────────────────

pub async fn sse_connect(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::unbounded_channel();

    let handler = McpHandler::new(state.mem_client(), session_id.clone());
    state
        .sse_sessions
        .insert(
            session_id.clone(),
            SseSession {
                handler: Mutex::new(handler),
                tx: tx.clone(),
            },
        )
        .await;
    tracing::info!(session_id = %session_id, "sse: connection opened");

    // Handshake: first event announces the companion write endpoint.
    let _ = tx.send(
        Event::default()
            .event("endpoint")
            .data(format!("/messages?sessionId={session_id}")),
    );

    let stream = SessionEventStream {
        inner: UnboundedReceiverStream::new(rx),
        _guard: DisconnectGuard {
            store: state.sse_sessions.clone(),
            session_id,
        },
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Event stream for one session. Dropping it (client disconnect, network
/// failure) tears the session down via the embedded guard.
pub struct SessionEventStream {
    inner: UnboundedReceiverStream<Event>,
    _guard: DisconnectGuard,
}

impl Stream for SessionEventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx).map(|opt| opt.map(Ok))
    }
}

struct DisconnectGuard {
    store: Arc<SessionStore<SseSession>>,
    session_id: String,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let store = self.store.clone();
        let session_id = std::mem::take(&mut self.session_id);
        // Drop runs in a sync context; the async removal is handed to the
        // runtime. If the runtime is already gone (shutdown) the whole map
        // goes with it, so skipping is fine.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if store.remove(&session_id).await {
                    tracing::info!(session_id = %session_id, "sse: connection closed, session removed");
                }
            });
        }
    }
}

// ── POST /messages — the companion write path ───────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

pub async fn post_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    Json(message): Json<Value>,
) -> Response {
    let Some(session_id) = query.session_id else {
        return ApiError::BadRequest("Missing sessionId query parameter".to_string())
            .into_response();
    };

    let Some(session) = state.sse_sessions.get(&session_id).await else {
        return ApiError::NotFound(format!("Session not found: {session_id}")).into_response();
    };

    let response = {
        let handler = session.inner.handler.lock().await;
        handler.handle(&message).await
    };

    if let Some(response) = response
        && session
            .inner
            .tx
            .send(Event::default().event("message").data(response.to_string()))
            .is_err()
    {
        tracing::warn!(session_id = %session_id, "sse: stream closed before response delivery");
    }

    StatusCode::ACCEPTED.into_response()
}

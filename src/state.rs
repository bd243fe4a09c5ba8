// src/state.rs
// Application state

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;

use crate::config::Config;
use crate::mcp::session::{SESSION_TTL, SessionStore};
use crate::mcp::sse::SseSession;
use crate::mcp::streamable::StreamableSession;
use crate::mem::client::MemClient;

/// Central application state. Clone-friendly — every field is an Arc or an
/// Arc-backed handle. The two session stores are constructed exactly once
/// here and shared by reference with the router and the reaper.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Client,
    pub start_time: Instant,
    /// Streamable-transport sessions, idle-evicted by the reaper.
    pub streamable_sessions: Arc<SessionStore<StreamableSession>>,
    /// SSE-transport sessions, evicted on disconnect. No TTL.
    pub sse_sessions: Arc<SessionStore<SseSession>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        tracing::info!(
            "AppState initialised — Mem API at {}, credential {}",
            config.api_url,
            if config.api_key.is_some() { "configured" } else { "missing" }
        );

        Self {
            config: Arc::new(config),
            client,
            start_time: Instant::now(),
            streamable_sessions: Arc::new(SessionStore::new(Some(SESSION_TTL))),
            sse_sessions: Arc::new(SessionStore::new(None)),
        }
    }

    /// A Mem client sharing the process-wide connection pool. Each MCP
    /// session gets its own instance.
    pub fn mem_client(&self) -> MemClient {
        MemClient::new(self.client.clone(), &self.config)
    }
}

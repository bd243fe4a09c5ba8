// ---------------------------------------------------------------------------
// handlers/system.rs — Health and server info
// ---------------------------------------------------------------------------

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;
use crate::tools::ToolRegistry;

/// GET /api/health — process status + live session counts per transport.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "api_key_configured": state.config.api_key.is_some(),
        "sessions": {
            "streamable": state.streamable_sessions.len().await,
            "sse": state.sse_sessions.len().await,
        }
    }))
}

/// GET /api/info — server identity plus the declarative tool list.
pub async fn info() -> Json<Value> {
    let registry = ToolRegistry::new();
    Json(json!({
        "name": "mem-mcp-server",
        "version": env!("CARGO_PKG_VERSION"),
        "transports": ["streamable-http", "sse"],
        "tools": registry.describe(),
    }))
}

pub mod config;
pub mod handlers;
pub mod mcp;
pub mod mem;
pub mod state;
pub mod tools;

use axum::Router;
use axum::routing::{any, get, post};

use state::AppState;

/// Build the application router with the given state.
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a network port.
pub fn create_router(state: AppState) -> Router {
    // Idle eviction for streamable sessions. SSE sessions need none — they
    // die with their connection.
    let _ = mcp::session::spawn_reaper(state.streamable_sessions.clone());

    Router::new()
        // Health + introspection
        .route("/api/health", get(handlers::health))
        .route("/api/info", get(handlers::info))
        // Streamable HTTP transport — one endpoint, all methods
        .route("/mcp", any(mcp::streamable::mcp_endpoint))
        // Legacy HTTP+SSE transport
        .route("/sse", get(mcp::sse::sse_connect))
        .route("/messages", post(mcp::sse::post_message))
        // Shared state
        .with_state(state)
}

//! MCP inbound surface — protocol handler, session stores, two transports.
//!
//! **Streamable HTTP** (`streamable`): single `/mcp` endpoint, sessions
//! correlated by the `Mcp-Session-Id` header, idle sessions reaped.
//!
//! **Legacy HTTP+SSE** (`sse`): `GET /sse` opens the event stream and
//! announces the session id in-band; `POST /messages?sessionId=...` carries
//! client messages. Session lifetime is tied to the open connection.
//!
//! Protocol: JSON-RPC 2.0. Spec: <https://spec.modelcontextprotocol.io/2024-11-05/>

pub mod protocol;
pub mod session;
pub mod sse;
pub mod streamable;

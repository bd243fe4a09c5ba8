// src/mcp/protocol.rs
//! Per-session MCP message handler — JSON-RPC 2.0.
//!
//! Supported methods:
//! - `initialize` — server info + capabilities
//! - `notifications/initialized` — client ack (no-op)
//! - `ping` — health check
//! - `tools/list` — list all available tools
//! - `tools/call` — execute a tool
//!
//! Every session owns exactly one handler, and every handler owns its own
//! tool registry and Mem client. Tool failures of any class come back inside
//! the `tools/call` result with `isError` set — a handler never throws past
//! the transport.

use serde_json::{Value, json};

use crate::mem::client::MemClient;
use crate::tools::{ToolRegistry, execute_tool};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// One protocol handler, bound to one session id for its whole life.
pub struct McpHandler {
    registry: ToolRegistry,
    client: MemClient,
    session_id: String,
}

impl McpHandler {
    pub fn new(client: MemClient, session_id: String) -> Self {
        Self {
            registry: ToolRegistry::new(),
            client,
            session_id,
        }
    }

    /// Process one decoded JSON-RPC message. Notifications (no `id`) return
    /// `None` — there is nothing to send back for them.
    pub async fn handle(&self, message: &Value) -> Option<Value> {
        let method = message.get("method").and_then(|m| m.as_str()).unwrap_or("");

        let Some(id) = message.get("id").cloned() else {
            match method {
                "notifications/initialized" => {
                    tracing::debug!(session_id = %self.session_id, "client initialized");
                }
                other => {
                    tracing::debug!(session_id = %self.session_id, method = %other, "ignoring notification");
                }
            }
            return None;
        };

        tracing::debug!(session_id = %self.session_id, method = %method, "mcp request");

        Some(match method {
            "initialize" => self.handle_initialize(&id),
            "ping" => json_rpc_result(&id, json!({})),
            "tools/list" => json_rpc_result(&id, json!({ "tools": self.registry.describe() })),
            "tools/call" => self.handle_tools_call(message, &id).await,
            _ => json_rpc_error(id, -32601, &format!("Method not found: {method}")),
        })
    }

    fn handle_initialize(&self, id: &Value) -> Value {
        json_rpc_result(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listChanged": false }
                },
                "serverInfo": {
                    "name": "mem-mcp-server",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": "Adapter for the Mem notes API. Search, list, read and create \
                    notes, browse collections, and submit raw text for Mem's asynchronous \
                    intelligent processing."
            }),
        )
    }

    async fn handle_tools_call(&self, message: &Value, id: &Value) -> Value {
        let params = message.get("params").cloned().unwrap_or(json!({}));
        let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        if tool_name.is_empty() {
            return json_rpc_error(id.clone(), -32602, "Missing 'name' in params");
        }

        let Some(def) = self.registry.find(tool_name) else {
            return json_rpc_error(id.clone(), -32602, &format!("Unknown tool: {tool_name}"));
        };

        tracing::info!(session_id = %self.session_id, tool = %tool_name, "tools/call");

        let outcome = execute_tool(def.kind, &arguments, &self.client).await;
        json_rpc_result(
            id,
            json!({
                "content": [{ "type": "text", "text": outcome.text }],
                "isError": outcome.is_error
            }),
        )
    }
}

// ── JSON-RPC helpers ────────────────────────────────────────────────────────

pub fn json_rpc_result(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn json_rpc_error(id: Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

/// Does this message start a new streamable session?
pub fn is_initialize(message: &Value) -> bool {
    message.get("method").and_then(|m| m.as_str()) == Some("initialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::mem::client::ApiGeneration;

    fn test_handler() -> McpHandler {
        let config = Config {
            api_key: None,
            api_url: "https://api.mem.ai".to_string(),
            generation: ApiGeneration::V1,
            port: 8080,
            allowed_origins: None,
        };
        let client = MemClient::new(reqwest::Client::new(), &config);
        McpHandler::new(client, "test-session".to_string())
    }

    #[tokio::test]
    async fn initialize_reports_capabilities_and_server_info() {
        let handler = test_handler();
        let response = handler
            .handle(&json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }))
            .await
            .unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "mem-mcp-server");
    }

    #[tokio::test]
    async fn tools_list_enumerates_registry() {
        let handler = test_handler();
        let response = handler
            .handle(&json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }))
            .await
            .unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
    }

    #[tokio::test]
    async fn ping_returns_empty_result() {
        let handler = test_handler();
        let response = handler
            .handle(&json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" }))
            .await
            .unwrap();
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn unknown_method_is_32601() {
        let handler = test_handler();
        let response = handler
            .handle(&json!({ "jsonrpc": "2.0", "id": 4, "method": "resources/list" }))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn notification_produces_no_response() {
        let handler = test_handler();
        let response = handler
            .handle(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn tool_call_with_bad_arguments_is_flagged_not_thrown() {
        let handler = test_handler();
        let response = handler
            .handle(&json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": { "name": "search_notes", "arguments": {} }
            }))
            .await
            .unwrap();
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Invalid arguments:"));
    }

    #[tokio::test]
    async fn tool_call_without_credential_is_upstream_class_failure() {
        let handler = test_handler();
        let response = handler
            .handle(&json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "tools/call",
                "params": { "name": "search_notes", "arguments": { "query": "budget" } }
            }))
            .await
            .unwrap();
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Mem API error:"));
        assert!(text.contains("MEM_API_KEY"));
    }

    #[tokio::test]
    async fn unknown_tool_is_32602() {
        let handler = test_handler();
        let response = handler
            .handle(&json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": { "name": "delete_everything", "arguments": {} }
            }))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32602);
    }
}

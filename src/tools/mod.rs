// src/tools/mod.rs
//! Tool registry and execution for the MCP surface.
//!
//! Seven tools, each a pure translation: validate arguments against the
//! declared schema, issue one Mem API call, render the JSON response into a
//! single text block. The registry is a fixed table built once per session —
//! there is no runtime registration.
//!
//! Failures never escape as protocol faults. Both failure classes come back
//! as a tool result with the error flag set, with a distinguishing prefix:
//! - `Invalid arguments: ...` — the client sent bad input (schema class)
//! - `Mem API error: ...` — the upstream call failed (remote-service class)

mod collections;
mod notes;

use serde_json::{Value, json};

use crate::mem::client::{MemApiError, MemClient};

/// Truncation length for single-note reads and search hits.
pub(crate) const SINGLE_TRUNCATE: usize = 500;
/// Truncation length for list views.
pub(crate) const LIST_TRUNCATE: usize = 300;

// ── Tool table ──────────────────────────────────────────────────────────────

/// Dispatch tag — one variant per tool, matched in `execute_tool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    SearchNotes,
    ListNotes,
    CreateNote,
    GetNote,
    MemIt,
    ListCollections,
    SearchCollections,
}

/// One entry in the tool table. Immutable after registry construction.
#[derive(Debug, Clone)]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ToolKind,
    pub input_schema: Value,
}

/// The fixed tool table. Each MCP session owns its own instance.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: vec![
                tool("search_notes", "Search notes by a free-text query.", ToolKind::SearchNotes, json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Free-text search query" },
                        "limit": { "type": "integer", "description": "Max results to return (1-50, default 10)" }
                    },
                    "required": ["query"]
                })),
                tool("list_notes", "List notes, newest first. Paginated via an opaque cursor.", ToolKind::ListNotes, json!({
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Max notes per page (1-100, default 20)" },
                        "cursor": { "type": "string", "description": "Pagination cursor from a previous call" }
                    }
                })),
                tool("create_note", "Create a new note with markdown content.", ToolKind::CreateNote, json!({
                    "type": "object",
                    "properties": {
                        "content": { "type": "string", "description": "Note body (markdown)" },
                        "title": { "type": "string", "description": "Optional note title" },
                        "collection_ids": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Collections to file the note into"
                        }
                    },
                    "required": ["content"]
                })),
                tool("get_note", "Read a single note by its ID.", ToolKind::GetNote, json!({
                    "type": "object",
                    "properties": {
                        "note_id": { "type": "string", "description": "ID of the note to read" }
                    },
                    "required": ["note_id"]
                })),
                tool("mem_it", "Submit raw text to Mem for asynchronous intelligent processing (auto-titling, filing, linking).", ToolKind::MemIt, json!({
                    "type": "object",
                    "properties": {
                        "input": { "type": "string", "description": "Raw text to process" },
                        "instructions": { "type": "string", "description": "Optional processing instructions" }
                    },
                    "required": ["input"]
                })),
                tool("list_collections", "List collections. Paginated via an opaque cursor.", ToolKind::ListCollections, json!({
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Max collections per page (1-100, default 20)" },
                        "cursor": { "type": "string", "description": "Pagination cursor from a previous call" }
                    }
                })),
                tool("search_collections", "Search collections by a free-text query.", ToolKind::SearchCollections, json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Free-text search query" },
                        "limit": { "type": "integer", "description": "Max results to return (1-50, default 10)" }
                    },
                    "required": ["query"]
                })),
            ],
        }
    }

    /// MCP `tools/list` descriptors.
    pub fn describe(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema,
                })
            })
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn tool(
    name: &'static str,
    description: &'static str,
    kind: ToolKind,
    input_schema: Value,
) -> ToolDef {
    ToolDef {
        name,
        description,
        kind,
        input_schema,
    }
}

// ── Execution ───────────────────────────────────────────────────────────────

/// Result of a tool invocation — always a text block, flagged on failure.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn text(s: String) -> Self {
        Self {
            text: s,
            is_error: false,
        }
    }

    pub fn error(s: String) -> Self {
        Self {
            text: s,
            is_error: true,
        }
    }
}

/// Why a tool invocation failed. The two classes render with different
/// prefixes so clients can tell their own bad input from a remote fault.
#[derive(Debug)]
pub enum ToolFailure {
    InvalidArguments(String),
    Upstream(MemApiError),
}

impl From<MemApiError> for ToolFailure {
    fn from(e: MemApiError) -> Self {
        ToolFailure::Upstream(e)
    }
}

pub async fn execute_tool(kind: ToolKind, args: &Value, client: &MemClient) -> ToolOutcome {
    let result = match kind {
        ToolKind::SearchNotes => notes::search_notes(args, client).await,
        ToolKind::ListNotes => notes::list_notes(args, client).await,
        ToolKind::CreateNote => notes::create_note(args, client).await,
        ToolKind::GetNote => notes::get_note(args, client).await,
        ToolKind::MemIt => notes::mem_it(args, client).await,
        ToolKind::ListCollections => collections::list_collections(args, client).await,
        ToolKind::SearchCollections => collections::search_collections(args, client).await,
    };

    match result {
        Ok(text) => ToolOutcome::text(text),
        Err(ToolFailure::InvalidArguments(msg)) => {
            ToolOutcome::error(format!("Invalid arguments: {msg}"))
        }
        Err(ToolFailure::Upstream(e)) => ToolOutcome::error(format!("Mem API error: {e}")),
    }
}

// ── Argument validation helpers ─────────────────────────────────────────────
// `null` counts as unset for optional arguments.

pub(crate) fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolFailure> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ToolFailure::InvalidArguments(format!(
            "Missing required argument: {key}"
        ))),
        Some(Value::String(s)) if s.is_empty() => Err(ToolFailure::InvalidArguments(format!(
            "Argument '{key}' must not be empty"
        ))),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ToolFailure::InvalidArguments(format!(
            "Argument '{key}' must be a string"
        ))),
    }
}

pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, ToolFailure> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ToolFailure::InvalidArguments(format!(
            "Argument '{key}' must be a string"
        ))),
    }
}

pub(crate) fn optional_limit(
    args: &Value,
    key: &str,
    min: i64,
    max: i64,
) -> Result<Option<i64>, ToolFailure> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let n = v.as_i64().ok_or_else(|| {
                ToolFailure::InvalidArguments(format!("Argument '{key}' must be an integer"))
            })?;
            if n < min || n > max {
                return Err(ToolFailure::InvalidArguments(format!(
                    "Argument '{key}' must be between {min} and {max}"
                )));
            }
            Ok(Some(n))
        }
    }
}

pub(crate) fn optional_str_array(
    args: &Value,
    key: &str,
) -> Result<Option<Vec<String>>, ToolFailure> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(s) => out.push(s.to_string()),
                    None => {
                        return Err(ToolFailure::InvalidArguments(format!(
                            "Argument '{key}' must be an array of strings"
                        )));
                    }
                }
            }
            Ok(Some(out))
        }
        Some(_) => Err(ToolFailure::InvalidArguments(format!(
            "Argument '{key}' must be an array of strings"
        ))),
    }
}

// ── Rendering helpers shared by notes + collections ─────────────────────────

/// Truncate to `max_len` bytes at a char boundary, marking the cut with an
/// ellipsis. Content at or under the limit passes through unmodified.
pub(crate) fn truncate_content(s: &str, max_len: usize) -> String {
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

/// Title of an item, or the fixed placeholder when the upstream left it out.
pub(crate) fn title_of(item: &Value) -> &str {
    item.get("title")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
}

pub(crate) fn id_of(item: &Value) -> &str {
    item.get("id").and_then(|v| v.as_str()).unwrap_or("unknown")
}

/// Trailing pagination hint. The cursor is surfaced, never followed.
pub(crate) fn append_cursor_hint(out: &mut String, response: &Value) {
    if let Some(cursor) = response.get("cursor").and_then(|c| c.as_str())
        && !cursor.is_empty()
    {
        out.push_str(&format!("\n\nMore results available. Pass cursor: {cursor}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_all_seven_tools() {
        let registry = ToolRegistry::new();
        let described = registry.describe();
        assert_eq!(described.len(), 7);
        let names: Vec<&str> = described
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"search_notes"));
        assert!(names.contains(&"mem_it"));
        assert!(names.contains(&"search_collections"));
    }

    #[test]
    fn find_is_exact_match() {
        let registry = ToolRegistry::new();
        assert!(registry.find("get_note").is_some());
        assert!(registry.find("get_notes").is_none());
    }

    #[test]
    fn truncate_at_boundary_is_untouched() {
        let exactly = "a".repeat(LIST_TRUNCATE);
        assert_eq!(truncate_content(&exactly, LIST_TRUNCATE), exactly);
    }

    #[test]
    fn truncate_one_over_is_marked() {
        let over = "a".repeat(LIST_TRUNCATE + 1);
        let rendered = truncate_content(&over, LIST_TRUNCATE);
        assert!(rendered.ends_with("..."));
        assert_eq!(rendered.len(), LIST_TRUNCATE + 3);
    }

    #[test]
    fn require_str_reports_missing_and_wrong_type() {
        let args = serde_json::json!({ "limit": 3 });
        match require_str(&args, "query") {
            Err(ToolFailure::InvalidArguments(msg)) => {
                assert_eq!(msg, "Missing required argument: query")
            }
            other => panic!("unexpected: {other:?}"),
        }
        match require_str(&serde_json::json!({ "query": 42 }), "query") {
            Err(ToolFailure::InvalidArguments(msg)) => {
                assert_eq!(msg, "Argument 'query' must be a string")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn optional_limit_enforces_range() {
        let args = serde_json::json!({ "limit": 70 });
        assert!(optional_limit(&args, "limit", 1, 50).is_err());
        let args = serde_json::json!({ "limit": 50 });
        assert_eq!(optional_limit(&args, "limit", 1, 50).unwrap(), Some(50));
        assert_eq!(
            optional_limit(&serde_json::json!({}), "limit", 1, 50).unwrap(),
            None
        );
    }

    #[test]
    fn null_optional_counts_as_unset() {
        let args = serde_json::json!({ "cursor": null, "collection_ids": null });
        assert_eq!(optional_str(&args, "cursor").unwrap(), None);
        assert_eq!(optional_str_array(&args, "collection_ids").unwrap(), None);
    }
}

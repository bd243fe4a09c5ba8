// src/tools/collections.rs
//! Collection tools: list and search.

use serde_json::Value;

use crate::mem::client::MemClient;

use super::{
    LIST_TRUNCATE, ToolFailure, append_cursor_hint, id_of, optional_limit, optional_str,
    require_str, title_of, truncate_content,
};

// ── Handlers ────────────────────────────────────────────────────────────────

pub(super) async fn list_collections(
    args: &Value,
    client: &MemClient,
) -> Result<String, ToolFailure> {
    let limit = optional_limit(args, "limit", 1, 100)?.unwrap_or(20);
    let cursor = optional_str(args, "cursor")?;
    let response = client.list_collections(Some(limit), cursor).await?;
    Ok(render_collection_list(&response))
}

pub(super) async fn search_collections(
    args: &Value,
    client: &MemClient,
) -> Result<String, ToolFailure> {
    let query = require_str(args, "query")?;
    let limit = optional_limit(args, "limit", 1, 50)?.unwrap_or(10);
    let response = client.search_collections(query, Some(limit)).await?;
    Ok(render_collection_search(query, &response))
}

// ── Rendering ───────────────────────────────────────────────────────────────

fn collection_block(collection: &Value) -> String {
    let mut block = format!("- {} (ID: {})", title_of(collection), id_of(collection));
    if let Some(count) = collection.get("note_count").and_then(|c| c.as_i64()) {
        block.push_str(&format!(" — {count} note(s)"));
    }
    if let Some(description) = collection
        .get("description")
        .and_then(|d| d.as_str())
        .filter(|d| !d.is_empty())
    {
        block.push_str("\n  ");
        block.push_str(&truncate_content(description, LIST_TRUNCATE));
    }
    block
}

fn render_collection_list(response: &Value) -> String {
    let empty = Vec::new();
    let collections = response
        .get("collections")
        .and_then(|c| c.as_array())
        .unwrap_or(&empty);

    if collections.is_empty() {
        return "No collections found.".to_string();
    }

    let mut out = format!("Found {} collection(s):", collections.len());
    for collection in collections {
        out.push_str("\n\n");
        out.push_str(&collection_block(collection));
    }
    append_cursor_hint(&mut out, response);
    out
}

fn render_collection_search(query: &str, response: &Value) -> String {
    let empty = Vec::new();
    let collections = response
        .get("collections")
        .and_then(|c| c.as_array())
        .unwrap_or(&empty);

    if collections.is_empty() {
        return format!("No collections found matching \"{query}\"");
    }

    let mut out = format!(
        "Found {} collection(s) matching \"{query}\":",
        collections.len()
    );
    for collection in collections {
        out.push_str("\n\n");
        out.push_str(&collection_block(collection));
    }
    append_cursor_hint(&mut out, response);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_collection_search_renders_fixed_sentence() {
        let rendered = render_collection_search("work", &json!({ "collections": [] }));
        assert_eq!(rendered, "No collections found matching \"work\"");
    }

    #[test]
    fn empty_collection_list_renders_no_results_sentence() {
        assert_eq!(render_collection_list(&json!({})), "No collections found.");
    }

    #[test]
    fn collection_list_renders_count_and_blocks() {
        let response = json!({
            "collections": [
                { "id": "c1", "title": "Work", "note_count": 12 },
                { "id": "c2", "description": "misc stuff" }
            ]
        });
        let rendered = render_collection_list(&response);
        assert!(rendered.starts_with("Found 2 collection(s):"));
        assert!(rendered.contains("Work (ID: c1) — 12 note(s)"));
        assert!(rendered.contains("Untitled (ID: c2)"));
        assert!(rendered.contains("misc stuff"));
    }

    #[test]
    fn long_description_is_truncated_in_list_view() {
        let description = "d".repeat(LIST_TRUNCATE + 1);
        let response = json!({ "collections": [{ "id": "c1", "title": "T", "description": description }] });
        let rendered = render_collection_list(&response);
        assert!(!rendered.contains(&description));
        assert!(rendered.contains("..."));
    }
}

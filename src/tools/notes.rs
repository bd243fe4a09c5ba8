// src/tools/notes.rs
//! Note tools: search, list, create, read, and mem-it submission.
//!
//! Each handler validates its arguments, makes one Mem API call, and renders
//! the response as a text block. Rendering is kept in pure functions so the
//! shapes can be pinned down in tests without a live upstream.

use serde_json::Value;

use crate::mem::client::MemClient;

use super::{
    SINGLE_TRUNCATE, LIST_TRUNCATE, ToolFailure, append_cursor_hint, id_of, optional_limit,
    optional_str, optional_str_array, require_str, title_of, truncate_content,
};

// ── Handlers ────────────────────────────────────────────────────────────────

pub(super) async fn search_notes(args: &Value, client: &MemClient) -> Result<String, ToolFailure> {
    let query = require_str(args, "query")?;
    let limit = optional_limit(args, "limit", 1, 50)?.unwrap_or(10);
    let response = client.search_notes(query, Some(limit)).await?;
    Ok(render_search_results(query, &response))
}

pub(super) async fn list_notes(args: &Value, client: &MemClient) -> Result<String, ToolFailure> {
    let limit = optional_limit(args, "limit", 1, 100)?.unwrap_or(20);
    let cursor = optional_str(args, "cursor")?;
    let response = client.list_notes(Some(limit), cursor).await?;
    Ok(render_note_list(&response))
}

pub(super) async fn create_note(args: &Value, client: &MemClient) -> Result<String, ToolFailure> {
    let content = require_str(args, "content")?;
    let title = optional_str(args, "title")?;
    let collection_ids = optional_str_array(args, "collection_ids")?;
    let response = client
        .create_note(content, title, collection_ids.as_deref())
        .await?;
    Ok(render_created_note(&response))
}

pub(super) async fn get_note(args: &Value, client: &MemClient) -> Result<String, ToolFailure> {
    let note_id = require_str(args, "note_id")?;
    let response = client.get_note(note_id).await?;
    Ok(render_note(&response))
}

pub(super) async fn mem_it(args: &Value, client: &MemClient) -> Result<String, ToolFailure> {
    let input = require_str(args, "input")?;
    let instructions = optional_str(args, "instructions")?;
    let response = client.mem_it(input, instructions).await?;
    Ok(render_mem_it(&response))
}

// ── Rendering ───────────────────────────────────────────────────────────────

fn render_search_results(query: &str, response: &Value) -> String {
    let empty = Vec::new();
    let notes = response
        .get("notes")
        .and_then(|n| n.as_array())
        .unwrap_or(&empty);

    if notes.is_empty() {
        return format!("No notes found matching \"{query}\"");
    }

    let mut out = format!("Found {} note(s) matching \"{query}\":", notes.len());
    for note in notes {
        out.push_str(&format!("\n\n{} (ID: {})", title_of(note), id_of(note)));
        if let Some(content) = note
            .get("content")
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
        {
            out.push('\n');
            out.push_str(&truncate_content(content, SINGLE_TRUNCATE));
        }
    }
    append_cursor_hint(&mut out, response);
    out
}

fn render_note_list(response: &Value) -> String {
    let empty = Vec::new();
    let notes = response
        .get("notes")
        .and_then(|n| n.as_array())
        .unwrap_or(&empty);

    if notes.is_empty() {
        return "No notes found.".to_string();
    }

    let mut out = format!("Found {} note(s):", notes.len());
    for note in notes {
        out.push_str(&format!("\n\n- {} (ID: {})", title_of(note), id_of(note)));
        if let Some(content) = note
            .get("content")
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
        {
            out.push_str("\n  ");
            out.push_str(&truncate_content(content, LIST_TRUNCATE));
        }
    }
    append_cursor_hint(&mut out, response);
    out
}

fn render_created_note(response: &Value) -> String {
    format!(
        "Created note \"{}\" (ID: {})",
        title_of(response),
        id_of(response)
    )
}

fn render_note(response: &Value) -> String {
    let mut out = format!("{} (ID: {})", title_of(response), id_of(response));
    if let Some(created) = response.get("created_at").and_then(|c| c.as_str()) {
        out.push_str(&format!("\nCreated: {created}"));
    }
    if let Some(content) = response
        .get("content")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
    {
        out.push_str("\n\n");
        out.push_str(&truncate_content(content, SINGLE_TRUNCATE));
    }
    out
}

fn render_mem_it(response: &Value) -> String {
    let request_id = response
        .get("request_id")
        .or_else(|| response.get("id"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let status = response
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("queued");
    format!("Submitted to Mem for intelligent processing. Request ID: {request_id} (status: {status})")
}

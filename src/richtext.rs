//! Rich-text normalization for catalog descriptions.
//!
//! CMS backends deliver descriptions either as plain strings or as rich-text
//! documents (`{"type": "doc", "content": [...]}`). The catalog stores plain
//! text only; block structure survives as line breaks.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Suffix appended by [`excerpt`] when text was cut.
pub const ELLIPSIS: &str = "...";

/// Flatten a description value into plain text.
///
/// Strings pass through untouched. Documents render paragraphs and headings as
/// lines, hard breaks as newlines and bullet lists as `- item` lines. Any other
/// shape yields an empty string.
pub fn to_plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("content") {
            Some(Value::Array(blocks)) => render_blocks(blocks),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

/// Truncate `text` to at most `max_chars` characters, appending [`ELLIPSIS`]
/// when anything was dropped.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Serde helper: accept a plain string, a rich-text document or null.
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_plain_text(&value))
}

fn render_blocks(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter_map(render_block)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_block(block: &Value) -> Option<String> {
    let kind = block.get("type").and_then(Value::as_str)?;
    let children = block.get("content").and_then(Value::as_array)?;
    match kind {
        "paragraph" | "heading" => Some(render_inline(children)),
        "bullet_list" => {
            let items: Vec<String> = children
                .iter()
                .filter_map(|item| item.get("content").and_then(Value::as_array))
                .map(|paragraphs| {
                    let text = paragraphs
                        .iter()
                        .filter_map(|p| p.get("content").and_then(Value::as_array))
                        .map(|inline| render_inline(inline))
                        .collect::<String>();
                    format!("- {text}")
                })
                .collect();
            Some(items.join("\n"))
        }
        _ => None,
    }
}

fn render_inline(nodes: &[Value]) -> String {
    nodes
        .iter()
        .map(|node| match node.get("type").and_then(Value::as_str) {
            Some("text") => node
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Some("hard_break") | Some("hardBreak") => "\n".to_string(),
            _ => String::new(),
        })
        .collect()
}

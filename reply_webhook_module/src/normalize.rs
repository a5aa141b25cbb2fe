//! Normalization of the reply webhook's loosely structured responses.
//!
//! The automation backend has shipped several response shapes over time:
//! a bare array, `{"response": [...]}`, `{"response": "..."}` and
//! `{"output": {"response": [...]}}`. This module collapses all of them
//! into one ordered list of reply items with a documented fallback.

use serde_json::Value;

use crate::types::ReplyItem;

/// Reply substituted when the service response contains nothing usable.
pub const FALLBACK_REPLY_TEXT: &str = "Thanks for reaching out! I'll get back to you shortly.";

/// Collapse a raw webhook response body into an ordered list of reply
/// items. Shape matchers are tried in priority order; a response matching
/// none of them, or matching one that turns out empty, yields a single
/// fallback text item so the caller always has something to deliver.
pub fn normalize_reply_payload(payload: &Value) -> Vec<ReplyItem> {
    let items: Vec<ReplyItem> = match payload {
        Value::Array(entries) => entries.iter().map(item_from_value).collect(),
        Value::String(text) => vec![ReplyItem::text(text.clone())],
        Value::Object(_) => {
            if let Some(entries) = payload.get("response").and_then(Value::as_array) {
                entries.iter().map(item_from_value).collect()
            } else if let Some(text) = payload.get("response").and_then(Value::as_str) {
                vec![ReplyItem::text(text)]
            } else if let Some(entries) = payload
                .pointer("/output/response")
                .and_then(Value::as_array)
            {
                entries.iter().map(item_from_value).collect()
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };

    if items.is_empty() {
        vec![ReplyItem::text(FALLBACK_REPLY_TEXT)]
    } else {
        items
    }
}

/// Convert one response entry into a reply item. Unrecognized shapes are
/// preserved as opaque text rather than dropped.
fn item_from_value(value: &Value) -> ReplyItem {
    match value {
        Value::String(text) => ReplyItem::text(text.clone()),
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("image") {
                if let Some(url) = map.get("url").and_then(Value::as_str) {
                    return ReplyItem::image(url);
                }
            }
            if let Some(content) = map
                .get("content")
                .or_else(|| map.get("text"))
                .and_then(Value::as_str)
            {
                return ReplyItem::text(content);
            }
            ReplyItem::text(value.to_string())
        }
        other => ReplyItem::text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_of_strings() {
        let items = normalize_reply_payload(&json!(["a", "b"]));
        assert_eq!(items, vec![ReplyItem::text("a"), ReplyItem::text("b")]);
    }

    #[test]
    fn response_array_field() {
        let items = normalize_reply_payload(&json!({"response": ["a", "b"]}));
        assert_eq!(items, vec![ReplyItem::text("a"), ReplyItem::text("b")]);
    }

    #[test]
    fn response_string_field() {
        let items = normalize_reply_payload(&json!({"response": "hello"}));
        assert_eq!(items, vec![ReplyItem::text("hello")]);
    }

    #[test]
    fn nested_output_response_array() {
        let items = normalize_reply_payload(&json!({"output": {"response": ["x"]}}));
        assert_eq!(items, vec![ReplyItem::text("x")]);
    }

    #[test]
    fn bare_string_wrapped() {
        let items = normalize_reply_payload(&json!("just text"));
        assert_eq!(items, vec![ReplyItem::text("just text")]);
    }

    #[test]
    fn unrecognized_shape_yields_fallback() {
        let items = normalize_reply_payload(&json!({}));
        assert_eq!(items, vec![ReplyItem::text(FALLBACK_REPLY_TEXT)]);
    }

    #[test]
    fn empty_response_array_yields_fallback() {
        let items = normalize_reply_payload(&json!({"response": []}));
        assert_eq!(items, vec![ReplyItem::text(FALLBACK_REPLY_TEXT)]);
    }

    #[test]
    fn image_items_recognized() {
        let items = normalize_reply_payload(&json!([
            {"type": "image", "url": "https://cdn.example.com/a.jpg"},
            {"type": "text", "content": "here you go"}
        ]));
        assert_eq!(
            items,
            vec![
                ReplyItem::image("https://cdn.example.com/a.jpg"),
                ReplyItem::text("here you go"),
            ]
        );
    }

    #[test]
    fn text_field_alias_recognized() {
        let items = normalize_reply_payload(&json!([{"type": "text", "text": "alias"}]));
        assert_eq!(items, vec![ReplyItem::text("alias")]);
    }

    #[test]
    fn opaque_objects_stringified_not_dropped() {
        let items = normalize_reply_payload(&json!([{"foo": 1}]));
        match &items[0] {
            ReplyItem::Text { content } => assert!(content.contains("foo")),
            other => panic!("expected text item, got {:?}", other),
        }
    }

    #[test]
    fn numeric_entries_stringified() {
        let items = normalize_reply_payload(&json!([42]));
        assert_eq!(items, vec![ReplyItem::text("42")]);
    }
}

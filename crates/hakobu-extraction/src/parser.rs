//! Response parsing
//!
//! Pulls the structured field set out of the service's free-form reply.
//! Replies commonly arrive wrapped in a ```json fence; the fenced content
//! and a bare JSON body parse identically.

use hakobu_core::AppError;
use serde_json::Value;

use crate::fields::{StructuredFieldSet, RECOGNIZED_KEYS};

pub fn parse(raw: &Value) -> Result<StructuredFieldSet, AppError> {
    let text = raw
        .get("content")
        .and_then(|c| c.as_array())
        .and_then(|blocks| blocks.first())
        .and_then(|block| block.get("text"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| {
            AppError::ResponseParse("Reply has no text content block".to_string())
        })?;

    let json_str = strip_code_fence(text);

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| AppError::ResponseParse(format!("Reply is not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| AppError::ResponseParse("Reply is not a JSON object".to_string()))?;

    if !RECOGNIZED_KEYS.iter().any(|key| object.contains_key(*key)) {
        return Err(AppError::ResponseParse(
            "Reply contains none of the expected fields".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::ResponseParse(format!("Reply fields malformed: {}", e)))
}

/// Strip a fenced code block wrapper when present. A ```json fence wins;
/// an unlabeled ``` fence is accepted as well.
fn strip_code_fence(text: &str) -> &str {
    if let Some(after) = text.split("```json").nth(1) {
        return after.split("```").next().unwrap_or(text).trim();
    }
    if text.contains("```") {
        if let Some(inner) = text.split("```").nth(1) {
            return inner.trim();
        }
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply_with_text(text: &str) -> Value {
        json!({
            "content": [{"type": "text", "text": text}],
            "model": "claude-sonnet-4-20250514",
            "usage": {"input_tokens": 100, "output_tokens": 50}
        })
    }

    #[test]
    fn test_fenced_and_unfenced_parse_identically() {
        let body = r#"{"sender_name": "Taro Yamada", "item_quantity": 2}"#;
        let fenced = format!("Here is the extracted data:\n```json\n{}\n```\n", body);

        let from_plain = parse(&reply_with_text(body)).unwrap();
        let from_fenced = parse(&reply_with_text(&fenced)).unwrap();
        assert_eq!(from_plain, from_fenced);
        assert_eq!(from_plain.sender_name, "Taro Yamada");
        assert_eq!(from_plain.item_quantity, 2);
    }

    #[test]
    fn test_unlabeled_fence_is_accepted() {
        let text = "```\n{\"recipient_name\": \"Hanako Sato\"}\n```";
        let fields = parse(&reply_with_text(text)).unwrap();
        assert_eq!(fields.recipient_name, "Hanako Sato");
    }

    #[test]
    fn test_missing_text_block_is_a_parse_error() {
        let err = parse(&json!({"content": []})).unwrap_err();
        assert!(matches!(err, AppError::ResponseParse(_)));

        let err = parse(&json!({"id": "msg_123"})).unwrap_err();
        assert!(matches!(err, AppError::ResponseParse(_)));
    }

    #[test]
    fn test_non_json_reply_is_a_parse_error() {
        let err = parse(&reply_with_text("I could not read this document.")).unwrap_err();
        assert!(matches!(err, AppError::ResponseParse(_)));
    }

    #[test]
    fn test_json_array_reply_is_a_parse_error() {
        let err = parse(&reply_with_text(r#"["sender_name"]"#)).unwrap_err();
        assert!(matches!(err, AppError::ResponseParse(_)));
    }

    #[test]
    fn test_unrelated_object_is_a_parse_error() {
        let err = parse(&reply_with_text(r#"{"answer": 42}"#)).unwrap_err();
        assert!(matches!(err, AppError::ResponseParse(_)));
    }

    #[test]
    fn test_unreadable_fields_default() {
        let body = r#"{"sender_name": "", "recipient_name": "Taro Yamada"}"#;
        let fields = parse(&reply_with_text(body)).unwrap();
        assert_eq!(fields.sender_name, "");
        assert_eq!(fields.item_name, "");
        assert_eq!(fields.item_quantity, 1);
        assert!(fields.request_amount.is_none());
    }
}

//! The structured field set produced by the response parser
//!
//! Twelve recognized keys. The extraction service is instructed to reply
//! with empty strings for unreadable fields, but real replies also mix up
//! numbers and numeric strings, so the numeric fields deserialize leniently
//! instead of trusting the instruction.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Keys the parser recognizes; a reply containing none of these is treated
/// as unparseable even when it is well-formed JSON.
pub const RECOGNIZED_KEYS: [&str; 12] = [
    "sender_name",
    "sender_phone",
    "sender_address",
    "recipient_name",
    "recipient_phone",
    "recipient_address",
    "item_name",
    "item_quantity",
    "delivery_date",
    "delivery_time",
    "special_instructions",
    "request_amount",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFieldSet {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender_phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender_address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recipient_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recipient_phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recipient_address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_name: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub item_quantity: i32,
    /// ISO calendar date string, or empty when unreadable.
    #[serde(default, deserialize_with = "lenient_string")]
    pub delivery_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delivery_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub special_instructions: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub request_amount: Option<Decimal>,
}

impl Default for StructuredFieldSet {
    fn default() -> Self {
        StructuredFieldSet {
            sender_name: String::new(),
            sender_phone: String::new(),
            sender_address: String::new(),
            recipient_name: String::new(),
            recipient_phone: String::new(),
            recipient_address: String::new(),
            item_name: String::new(),
            item_quantity: default_quantity(),
            delivery_date: String::new(),
            delivery_time: String::new(),
            special_instructions: String::new(),
            request_amount: None,
        }
    }
}

fn default_quantity() -> i32 {
    1
}

/// Strings stay strings; numbers and booleans render to their display form;
/// null and anything structural collapse to the empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Number, or numeric string; anything else falls back to 1.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let quantity = match value {
        Value::Number(n) => n.as_i64().unwrap_or(1),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(1),
        _ => 1,
    };
    Ok(quantity.clamp(1, i32::MAX as i64) as i32)
}

/// Number, or numeric string; empty/unparseable yield None.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_default_when_missing() {
        let fields: StructuredFieldSet = serde_json::from_str(r#"{"sender_name": "Taro Yamada"}"#).unwrap();
        assert_eq!(fields.sender_name, "Taro Yamada");
        assert_eq!(fields.recipient_name, "");
        assert_eq!(fields.item_quantity, 1);
        assert!(fields.request_amount.is_none());
    }

    #[test]
    fn test_quantity_accepts_number_and_numeric_string() {
        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"item_quantity": 5}"#).unwrap();
        assert_eq!(fields.item_quantity, 5);

        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"item_quantity": "12"}"#).unwrap();
        assert_eq!(fields.item_quantity, 12);

        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"item_quantity": ""}"#).unwrap();
        assert_eq!(fields.item_quantity, 1);

        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"item_quantity": null}"#).unwrap();
        assert_eq!(fields.item_quantity, 1);
    }

    #[test]
    fn test_amount_accepts_number_and_string_or_none() {
        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"request_amount": 4500}"#).unwrap();
        assert_eq!(fields.request_amount, Some(Decimal::from(4500)));

        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"request_amount": "3200.50"}"#).unwrap();
        assert_eq!(
            fields.request_amount,
            Some(Decimal::from_str("3200.50").unwrap())
        );

        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"request_amount": ""}"#).unwrap();
        assert!(fields.request_amount.is_none());
    }

    #[test]
    fn test_numeric_phone_renders_as_string() {
        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"sender_phone": 8012345678}"#).unwrap();
        assert_eq!(fields.sender_phone, "8012345678");
    }

    #[test]
    fn test_null_string_field_becomes_empty() {
        let fields: StructuredFieldSet =
            serde_json::from_str(r#"{"special_instructions": null}"#).unwrap();
        assert_eq!(fields.special_instructions, "");
    }

    #[test]
    fn test_recognized_keys_cover_every_field() {
        let fields = StructuredFieldSet::default();
        let json = serde_json::to_value(&fields).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), RECOGNIZED_KEYS.len());
        for key in RECOGNIZED_KEYS {
            assert!(object.contains_key(key), "missing key {}", key);
        }
    }
}

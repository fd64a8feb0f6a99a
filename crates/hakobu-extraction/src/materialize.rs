//! Delivery materialization
//!
//! Maps a structured field set onto a delivery-request draft. The API layer
//! persists the draft and links the originating document; this mapping stays
//! pure so its defaulting rules are easy to test.

use chrono::NaiveDate;
use hakobu_core::models::NewDeliveryRequest;
use uuid::Uuid;

use crate::fields::StructuredFieldSet;

/// Title used when the document yielded no readable item name.
pub const FALLBACK_TITLE: &str = "Delivery request created from uploaded document";

pub fn delivery_draft(fields: &StructuredFieldSet, requester_id: Uuid) -> NewDeliveryRequest {
    let title = if fields.item_name.trim().is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        fields.item_name.clone()
    };

    NewDeliveryRequest {
        requester_id,
        title,
        description: String::new(),
        sender_name: fields.sender_name.clone(),
        sender_phone: fields.sender_phone.clone(),
        sender_address: fields.sender_address.clone(),
        sender_lat: None,
        sender_lng: None,
        recipient_name: fields.recipient_name.clone(),
        recipient_phone: fields.recipient_phone.clone(),
        recipient_address: fields.recipient_address.clone(),
        recipient_lat: None,
        recipient_lng: None,
        item_name: fields.item_name.clone(),
        item_quantity: fields.item_quantity.max(1),
        item_weight: None,
        item_size: String::new(),
        delivery_date: parse_delivery_date(&fields.delivery_date),
        delivery_time: fields.delivery_time.clone(),
        special_instructions: fields.special_instructions.clone(),
        request_amount: fields.request_amount,
    }
}

/// ISO calendar date or nothing; free-text dates stay out of the date column.
fn parse_delivery_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_blank_item_name_uses_fallback_title() {
        let fields = StructuredFieldSet::default();
        let draft = delivery_draft(&fields, Uuid::new_v4());
        assert_eq!(draft.title, FALLBACK_TITLE);
        assert_eq!(draft.item_name, "");
        assert_eq!(draft.item_quantity, 1);
    }

    #[test]
    fn test_item_name_becomes_title() {
        let fields = StructuredFieldSet {
            item_name: "Office chairs".to_string(),
            item_quantity: 4,
            ..StructuredFieldSet::default()
        };
        let draft = delivery_draft(&fields, Uuid::new_v4());
        assert_eq!(draft.title, "Office chairs");
        assert_eq!(draft.item_quantity, 4);
    }

    #[test]
    fn test_delivery_date_parsing() {
        assert_eq!(
            parse_delivery_date("2026-08-20"),
            NaiveDate::from_ymd_opt(2026, 8, 20)
        );
        assert_eq!(parse_delivery_date(" 2026-08-20 "), NaiveDate::from_ymd_opt(2026, 8, 20));
        assert_eq!(parse_delivery_date(""), None);
        assert_eq!(parse_delivery_date("next Tuesday"), None);
        assert_eq!(parse_delivery_date("2026/08/20"), None);
    }

    #[test]
    fn test_fields_carry_through() {
        let requester = Uuid::new_v4();
        let fields = StructuredFieldSet {
            sender_name: "Hanako Sato".to_string(),
            recipient_name: "Taro Yamada".to_string(),
            recipient_address: "2-8-1 Nishi-Shinjuku, Tokyo".to_string(),
            item_name: "Documents".to_string(),
            delivery_date: "2026-09-01".to_string(),
            request_amount: Some(Decimal::from(4500)),
            ..StructuredFieldSet::default()
        };
        let draft = delivery_draft(&fields, requester);
        assert_eq!(draft.requester_id, requester);
        assert_eq!(draft.sender_name, "Hanako Sato");
        assert_eq!(draft.recipient_address, "2-8-1 Nishi-Shinjuku, Tokyo");
        assert_eq!(
            draft.delivery_date,
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
        assert_eq!(draft.request_amount, Some(Decimal::from(4500)));
    }
}

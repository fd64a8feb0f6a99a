//! Prompt construction for the document-understanding service
//!
//! Every document kind shares one fixed response schema; only the lead-in
//! and the embedded content differ. Image-bearing payloads carry exactly
//! one attachment: a multi-page scan contributes only its first page.

use crate::content::{ExtractedContent, ImagePayload};

/// The reply schema requested from the extraction service.
const SCHEMA_BLOCK: &str = r#"{
  "sender_name": "Sender's name",
  "sender_phone": "Sender's phone number",
  "sender_address": "Sender's address",
  "recipient_name": "Recipient's name",
  "recipient_phone": "Recipient's phone number",
  "recipient_address": "Delivery address",
  "item_name": "Item name",
  "item_quantity": "Quantity (numeric value)",
  "delivery_date": "Preferred delivery date (YYYY-MM-DD format)",
  "delivery_time": "Preferred delivery time",
  "special_instructions": "Special instructions",
  "request_amount": "Request amount (numeric value, extract monetary value if present)"
}"#;

const UNREADABLE_NOTE: &str = "For items that cannot be read, please use empty strings.";

/// What actually goes over the wire: an instruction, and at most one image.
#[derive(Debug, Clone)]
pub struct PromptPayload {
    pub instruction: String,
    pub image: Option<ImagePayload>,
}

pub fn build_prompt(content: &ExtractedContent) -> PromptPayload {
    match content {
        ExtractedContent::Image(image) => PromptPayload {
            instruction: format!(
                "This is a Japanese delivery instruction document or delivery-related image. \
                 Please extract the following information and return it in JSON format:\n\n{}\n\n\
                 The document may be rotated or handwritten. {}",
                SCHEMA_BLOCK, UNREADABLE_NOTE
            ),
            image: Some(image.clone()),
        },
        ExtractedContent::ScannedPdf { pages, .. } => PromptPayload {
            instruction: format!(
                "This is a scanned PDF containing a Japanese delivery instruction document. \
                 Please analyze the image and extract the following information in JSON format:\n\n{}\n\n\
                 The image may contain rotated or handwritten text. {}",
                SCHEMA_BLOCK, UNREADABLE_NOTE
            ),
            image: pages.first().cloned(),
        },
        ExtractedContent::Text { text, has_tables } => {
            let table_note = if *has_tables {
                "This includes tabular data. "
            } else {
                ""
            };
            PromptPayload {
                instruction: format!(
                    "The following is text extracted from a Japanese delivery instruction \
                     document or PDF. {}Please extract the following information and return it \
                     in JSON format:\n\n{}\n\n\
                     If there is table data, please extract information from it as well. {}\n\n\
                     Text content:\n{}",
                    table_note, SCHEMA_BLOCK, UNREADABLE_NOTE, text
                ),
                image: None,
            }
        }
        ExtractedContent::Rows(rows) => {
            let data_str = serde_json::to_string_pretty(rows)
                .unwrap_or_else(|_| "{}".to_string());
            PromptPayload {
                instruction: format!(
                    "The following is data extracted from a Japanese delivery-related \
                     spreadsheet or CSV file. Please analyze the delivery information and \
                     extract the following information in JSON format:\n\n{}\n\n\
                     If there are multiple delivery requests, please extract information from \
                     the first one. {}\n\n\
                     Data content:\n{}",
                    SCHEMA_BLOCK, UNREADABLE_NOTE, data_str
                ),
                image: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RowData;

    fn sample_image() -> ImagePayload {
        ImagePayload {
            media_type: "image/jpeg".to_string(),
            data: "aGVsbG8=".to_string(),
        }
    }

    #[test]
    fn test_image_prompt_carries_the_attachment() {
        let payload = build_prompt(&ExtractedContent::Image(sample_image()));
        assert!(payload.instruction.contains("sender_name"));
        assert!(payload.instruction.contains("empty strings"));
        assert_eq!(payload.image.as_ref().unwrap().media_type, "image/jpeg");
        // content travels as an attachment, never inline
        assert!(!payload.instruction.contains("aGVsbG8="));
    }

    #[test]
    fn test_scanned_pdf_uses_only_the_first_page() {
        let second = ImagePayload {
            media_type: "image/png".to_string(),
            data: "c2Vjb25k".to_string(),
        };
        let payload = build_prompt(&ExtractedContent::ScannedPdf {
            pages: vec![sample_image(), second],
            text: String::new(),
        });
        assert_eq!(payload.image.as_ref().unwrap().data, "aGVsbG8=");
    }

    #[test]
    fn test_text_prompt_embeds_content_and_flags_tables() {
        let payload = build_prompt(&ExtractedContent::Text {
            text: "Recipient: Taro Yamada".to_string(),
            has_tables: true,
        });
        assert!(payload.instruction.contains("tabular data"));
        assert!(payload.instruction.contains("Recipient: Taro Yamada"));
        assert!(payload.image.is_none());

        let payload = build_prompt(&ExtractedContent::Text {
            text: String::new(),
            has_tables: false,
        });
        assert!(!payload.instruction.contains("tabular data"));
    }

    #[test]
    fn test_rows_prompt_serializes_records() {
        let mut record = serde_json::Map::new();
        record.insert(
            "sender_name".to_string(),
            serde_json::Value::String("Hanako Sato".to_string()),
        );
        let payload = build_prompt(&ExtractedContent::Rows(RowData {
            headers: vec!["sender_name".to_string()],
            records: vec![record],
            summary: "1 rows x 1 columns".to_string(),
        }));
        assert!(payload.instruction.contains("Hanako Sato"));
        assert!(payload.instruction.contains("first one"));
        assert!(payload.image.is_none());
    }
}

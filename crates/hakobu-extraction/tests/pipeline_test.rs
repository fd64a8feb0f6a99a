//! End-to-end pipeline tests against a canned extraction service.

use async_trait::async_trait;
use hakobu_core::AppError;
use hakobu_extraction::pipeline::{self, PipelineFailure};
use hakobu_extraction::{DocumentUnderstanding, PromptPayload};
use serde_json::{json, Value};
use std::sync::Mutex;

/// Canned service: returns a fixed result and records the submitted payload.
struct MockService {
    result: Mutex<Option<Result<Value, AppError>>>,
    seen: Mutex<Vec<PromptPayload>>,
}

impl MockService {
    fn replying(value: Value) -> Self {
        MockService {
            result: Mutex::new(Some(Ok(value))),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: AppError) -> Self {
        MockService {
            result: Mutex::new(Some(Err(error))),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn last_payload(&self) -> PromptPayload {
        self.seen.lock().unwrap().last().cloned().expect("no submission recorded")
    }
}

#[async_trait]
impl DocumentUnderstanding for MockService {
    async fn submit(&self, payload: &PromptPayload) -> Result<Value, AppError> {
        self.seen.lock().unwrap().push(payload.clone());
        self.result
            .lock()
            .unwrap()
            .take()
            .expect("mock service invoked twice")
    }
}

fn fenced_reply(body: &str) -> Value {
    json!({
        "id": "msg_01",
        "content": [{"type": "text", "text": format!("```json\n{}\n```", body)}],
        "model": "claude-sonnet-4-20250514",
        "usage": {"input_tokens": 812, "output_tokens": 96}
    })
}

const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

#[tokio::test]
async fn jpeg_upload_round_trips_through_fenced_reply() {
    let service = MockService::replying(fenced_reply(
        r#"{
            "sender_name": "Taro Yamada",
            "sender_phone": "090-1234-5678",
            "recipient_name": "Hanako Sato",
            "item_name": "Winter coats",
            "item_quantity": "3",
            "delivery_date": "2026-08-20",
            "request_amount": 4500
        }"#,
    ));

    let output = pipeline::run(&service, &JPEG_MAGIC, "instruction.jpg", "image/jpeg")
        .await
        .expect("pipeline should succeed");

    assert_eq!(output.fields.sender_name, "Taro Yamada");
    assert_eq!(output.fields.item_quantity, 3);
    assert_eq!(output.fields.delivery_date, "2026-08-20");
    assert_eq!(output.raw_response["id"], "msg_01");

    // the image travelled as an attachment alongside the instruction
    let payload = service.last_payload();
    let image = payload.image.expect("image attachment");
    assert_eq!(image.media_type, "image/jpeg");
    assert!(payload.instruction.contains("sender_name"));
}

#[tokio::test]
async fn service_http_error_surfaces_without_raw_reply() {
    let service = MockService::failing(AppError::ExternalService {
        status: Some(400),
        body: r#"{"error": {"type": "invalid_request_error"}}"#.to_string(),
    });

    let failure = pipeline::run(&service, &JPEG_MAGIC, "instruction.jpg", "image/jpeg")
        .await
        .expect_err("pipeline should fail");

    match failure {
        PipelineFailure::Other(AppError::ExternalService { status, .. }) => {
            assert_eq!(status, Some(400));
        }
        other => panic!("Expected external service failure, got {:?}", other),
    }
}

#[tokio::test]
async fn unparseable_reply_keeps_the_raw_response() {
    let reply = json!({
        "id": "msg_02",
        "content": [{"type": "text", "text": "I was unable to read this document."}]
    });
    let service = MockService::replying(reply.clone());

    let failure = pipeline::run(&service, &JPEG_MAGIC, "instruction.jpg", "image/jpeg")
        .await
        .expect_err("pipeline should fail to parse");

    match failure {
        PipelineFailure::Parse {
            raw_response,
            error,
        } => {
            assert_eq!(raw_response, reply);
            assert!(matches!(error, AppError::ResponseParse(_)));
        }
        other => panic!("Expected parse failure, got {:?}", other),
    }
}

#[tokio::test]
async fn unsupported_format_never_reaches_the_service() {
    let service = MockService::replying(fenced_reply(r#"{"sender_name": "x"}"#));

    let failure = pipeline::run(&service, b"plain text", "notes.txt", "text/plain")
        .await
        .expect_err("pipeline should refuse");

    assert!(matches!(
        failure,
        PipelineFailure::Other(AppError::UnsupportedFormat(_))
    ));
    assert!(service.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn csv_rows_are_serialized_into_the_instruction() {
    let service = MockService::replying(fenced_reply(
        r#"{"sender_name": "Hanako Sato", "item_name": "Apples"}"#,
    ));

    let csv = "sender_name,item_name,item_quantity\nHanako Sato,Apples,3\n";
    let output = pipeline::run(&service, csv.as_bytes(), "orders.csv", "text/csv")
        .await
        .expect("pipeline should succeed");

    assert_eq!(output.fields.item_name, "Apples");
    let payload = service.last_payload();
    assert!(payload.image.is_none());
    assert!(payload.instruction.contains("Hanako Sato"));
    assert!(payload.instruction.contains("1 rows x 3 columns"));
}

//! External extraction client
//!
//! A typed client for the document-understanding API behind the
//! `DocumentUnderstanding` trait, so the pipeline can be exercised with a
//! mock. One POST per submission; no retry, no timeout override. The raw
//! response body is returned as JSON because callers persist it verbatim.

use async_trait::async_trait;
use hakobu_core::AppError;
use serde::Serialize;
use serde_json::Value;

use crate::prompt::PromptPayload;

const API_VERSION: &str = "2023-06-01";

/// Connection settings for the extraction service, taken from `Config`.
#[derive(Debug, Clone)]
pub struct ExtractionClientConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

/// The document-understanding service seam. Production uses `ClaudeClient`;
/// tests inject a canned implementation.
#[async_trait]
pub trait DocumentUnderstanding: Send + Sync {
    /// Submit a prompt and return the service's raw JSON reply.
    async fn submit(&self, payload: &PromptPayload) -> Result<Value, AppError>;
}

// Messages API request structures
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug)]
pub struct ClaudeClient {
    http_client: reqwest::Client,
    config: ExtractionClientConfig,
}

impl ClaudeClient {
    /// Build the client. An empty API key is a configuration error and is
    /// refused here, before any network traffic.
    pub fn new(config: ExtractionClientConfig) -> Result<Self, AppError> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "Extraction API key is not configured".to_string(),
            ));
        }
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    fn request_body(&self, payload: &PromptPayload) -> MessagesRequest {
        let mut content = vec![ContentBlock::Text {
            text: payload.instruction.clone(),
        }];
        if let Some(image) = &payload.image {
            content.push(ContentBlock::Image {
                source: ImageSource {
                    source_type: "base64".to_string(),
                    media_type: image.media_type.clone(),
                    data: image.data.clone(),
                },
            });
        }
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: vec![MessageParam {
                role: "user".to_string(),
                content,
            }],
        }
    }
}

#[async_trait]
impl DocumentUnderstanding for ClaudeClient {
    async fn submit(&self, payload: &PromptPayload) -> Result<Value, AppError> {
        let body = self.request_body(payload);

        tracing::debug!(
            model = %self.config.model,
            has_image = payload.image.is_some(),
            "Submitting document to extraction service"
        );

        let response = self
            .http_client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalService {
                status: Some(status.as_u16()),
                body: body_text,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            AppError::ResponseParse(format!("Service reply was not valid JSON: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ImagePayload;

    fn test_config() -> ExtractionClientConfig {
        ExtractionClientConfig {
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            api_key: "test-key-0123456789".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1000,
        }
    }

    #[test]
    fn test_empty_api_key_is_a_configuration_error() {
        let mut config = test_config();
        config.api_key = "   ".to_string();
        let err = ClaudeClient::new(config).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_request_body_shape_text_only() {
        let client = ClaudeClient::new(test_config()).unwrap();
        let body = client.request_body(&PromptPayload {
            instruction: "Extract the fields.".to_string(),
            image: None,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_request_body_shape_with_image() {
        let client = ClaudeClient::new(test_config()).unwrap();
        let body = client.request_body(&PromptPayload {
            instruction: "Extract the fields.".to_string(),
            image: Some(ImagePayload {
                media_type: "image/png".to_string(),
                data: "c2Nhbg==".to_string(),
            }),
        });
        let json = serde_json::to_value(&body).unwrap();
        let blocks = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1]["type"], "image");
        assert_eq!(blocks[1]["source"]["type"], "base64");
        assert_eq!(blocks[1]["source"]["media_type"], "image/png");
        assert_eq!(blocks[1]["source"]["data"], "c2Nhbg==");
    }
}

//! Extraction orchestration
//!
//! Wires the pure pipeline to persistence: ownership check, configuration
//! precondition, the compare-and-set claim of the document, and writing the
//! outcome back. Succeeded documents are terminal; failed ones stay
//! claimable for a manual retry.

use hakobu_core::models::{DeliveryRequest, ExtractionStatus, FileUpload};
use hakobu_core::AppError;
use hakobu_extraction::{delivery_draft, pipeline, PipelineFailure, StructuredFieldSet};
use uuid::Uuid;

use crate::auth::models::AuthUser;
use crate::state::AppState;

pub struct ExtractionService<'a> {
    state: &'a AppState,
}

impl<'a> ExtractionService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Run the extraction pipeline over one owned document.
    pub async fn run_extraction(
        &self,
        auth: &AuthUser,
        upload_id: Uuid,
    ) -> Result<FileUpload, AppError> {
        let upload = self
            .state
            .uploads
            .get_owned(upload_id, auth.id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        match upload.extraction_status {
            ExtractionStatus::Succeeded => {
                return Err(AppError::AlreadyProcessed(
                    "Document has already been processed".to_string(),
                ));
            }
            ExtractionStatus::Processing => {
                return Err(AppError::AlreadyProcessed(
                    "Extraction is already in progress".to_string(),
                ));
            }
            ExtractionStatus::Uploaded | ExtractionStatus::Failed => {}
        }

        // Configuration precondition, checked before any state change or
        // network traffic.
        let client = self.state.extraction_client.as_ref().ok_or_else(|| {
            AppError::Configuration("Extraction API key is not configured".to_string())
        })?;

        // Conditional claim: a concurrent duplicate request loses here.
        let claimed = self
            .state
            .uploads
            .claim_for_extraction(upload_id)
            .await?
            .ok_or_else(|| {
                AppError::AlreadyProcessed(
                    "Document was claimed by another extraction request".to_string(),
                )
            })?;

        let content = match self.state.uploads.get_content(upload_id).await? {
            Some(content) => content,
            None => {
                // Deleted between the claim and the read.
                self.state.uploads.mark_failed(upload_id, None).await?;
                return Err(AppError::NotFound("File not found".to_string()));
            }
        };

        let outcome = pipeline::run(
            client.as_ref(),
            &content,
            &claimed.original_name,
            &claimed.mime_type,
        )
        .await;

        match outcome {
            Ok(output) => {
                let extracted_data = serde_json::to_value(&output.fields)?;
                let upload = self
                    .state
                    .uploads
                    .mark_succeeded(upload_id, output.raw_response, extracted_data)
                    .await?;
                Ok(upload)
            }
            Err(PipelineFailure::Parse {
                raw_response,
                error,
            }) => {
                // Keep the undecodable reply for diagnosis; the document
                // stays claimable.
                self.state
                    .uploads
                    .mark_failed(upload_id, Some(raw_response))
                    .await?;
                Err(error)
            }
            Err(PipelineFailure::Other(error)) => {
                self.state.uploads.mark_failed(upload_id, None).await?;
                Err(error)
            }
        }
    }

    /// Create a delivery request from a successfully extracted document and
    /// link the document to it.
    pub async fn materialize(
        &self,
        auth: &AuthUser,
        upload_id: Uuid,
    ) -> Result<(DeliveryRequest, FileUpload), AppError> {
        let upload = self
            .state
            .uploads
            .get_owned(upload_id, auth.id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let extracted_data = match (&upload.extracted_data, upload.is_processed()) {
            (Some(data), true) => data.clone(),
            _ => {
                return Err(AppError::NotYetProcessed(
                    "Document has not been processed yet".to_string(),
                ));
            }
        };

        let fields: StructuredFieldSet = serde_json::from_value(extracted_data)
            .map_err(|e| AppError::Internal(format!("Stored field set is malformed: {}", e)))?;

        let draft = delivery_draft(&fields, auth.id);
        let request = self.state.deliveries.create(&draft).await?;
        let upload = self
            .state
            .uploads
            .link_delivery_request(upload.id, request.id)
            .await?;

        tracing::info!(
            upload_id = %upload.id,
            delivery_request_id = %request.id,
            "Delivery request materialized from document"
        );

        Ok((request, upload))
    }
}

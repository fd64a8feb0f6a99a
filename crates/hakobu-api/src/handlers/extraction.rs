//! Extraction and materialization endpoints

use crate::auth::models::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::extraction::ExtractionService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hakobu_core::models::DeliveryRequestResponse;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractionResultResponse {
    pub message: String,
    pub extracted_data: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MaterializeResponse {
    pub message: String,
    pub delivery_request: DeliveryRequestResponse,
}

#[utoipa::path(
    post,
    path = "/api/v0/files/uploads/{id}/extract",
    tag = "files",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 200, description = "Extraction completed", body = ExtractionResultResponse),
        (status = 400, description = "Unsupported or unreadable document", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Already processed", body = ErrorResponse),
        (status = 502, description = "Extraction service failed", body = ErrorResponse)
    )
)]
pub async fn extract_document(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ExtractionResultResponse>, HttpAppError> {
    let service = ExtractionService::new(&state);
    let upload = service.run_extraction(&auth, id).await?;

    Ok(Json(ExtractionResultResponse {
        message: "Document processed successfully".to_string(),
        extracted_data: upload.extracted_data.unwrap_or(serde_json::Value::Null),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v0/files/uploads/{id}/create-delivery",
    tag = "files",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 201, description = "Delivery request created", body = MaterializeResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Document not yet processed", body = ErrorResponse)
    )
)]
pub async fn create_delivery_from_upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<MaterializeResponse>), HttpAppError> {
    let service = ExtractionService::new(&state);
    let (request, _upload) = service.materialize(&auth, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(MaterializeResponse {
            message: "Delivery request created".to_string(),
            delivery_request: DeliveryRequestResponse::from(request),
        }),
    ))
}

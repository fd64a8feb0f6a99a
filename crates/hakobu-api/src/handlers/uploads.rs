//! File upload endpoints
//!
//! Uploads are stored in the database with their bytes; the 10 MB cap and
//! the category tag come from the multipart form. Listing is scoped to the
//! caller, except seed users asking for everything.

use crate::auth::models::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use hakobu_core::models::{FileCategory, FileUploadResponse, NewFileUpload};
use hakobu_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    all_files: bool,
}

#[utoipa::path(
    get,
    path = "/api/v0/files/uploads",
    tag = "files",
    params(
        ("all_files" = Option<bool>, Query, description = "Seed users: list every upload")
    ),
    responses(
        (status = 200, description = "Uploads", body = [FileUploadResponse])
    )
)]
pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FileUploadResponse>>, HttpAppError> {
    let uploads = if auth.is_seed() && query.all_files {
        state.uploads.list_all().await?
    } else {
        state.uploads.list_by_uploader(auth.id).await?
    };

    Ok(Json(
        uploads.into_iter().map(FileUploadResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v0/files/uploads",
    tag = "files",
    responses(
        (status = 201, description = "File uploaded", body = FileUploadResponse),
        (status = 400, description = "Missing or empty file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileUploadResponse>), HttpAppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut file_type = FileCategory::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let original_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| AppError::InvalidInput("File has no filename".to_string()))?;
                let mime_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read file: {}", e)))?;
                file = Some((original_name, mime_type, data.to_vec()));
            }
            Some("file_type") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Malformed field: {}", e)))?;
                file_type = parse_category(&raw)?;
            }
            _ => {}
        }
    }

    let (original_name, mime_type, content) =
        file.ok_or_else(|| AppError::InvalidInput("No file was provided".to_string()))?;

    if content.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()).into());
    }
    if content.len() > state.config.max_upload_bytes() {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} byte limit",
            state.config.max_upload_bytes()
        ))
        .into());
    }

    let upload = state
        .uploads
        .create(&NewFileUpload {
            uploader_id: auth.id,
            content,
            original_name,
            file_type,
            mime_type,
        })
        .await?;

    tracing::info!(
        upload_id = %upload.id,
        uploader_id = %auth.id,
        file_size = upload.file_size,
        "File uploaded"
    );

    Ok((StatusCode::CREATED, Json(FileUploadResponse::from(upload))))
}

fn parse_category(raw: &str) -> Result<FileCategory, AppError> {
    match raw {
        "delivery_document" => Ok(FileCategory::DeliveryDocument),
        "receipt" => Ok(FileCategory::Receipt),
        "other" => Ok(FileCategory::Other),
        other => Err(AppError::InvalidInput(format!(
            "Unknown file type '{}'",
            other
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/files/uploads/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 200, description = "Upload", body = FileUploadResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FileUploadResponse>, HttpAppError> {
    let upload = state
        .uploads
        .get_owned(id, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(Json(FileUploadResponse::from(upload)))
}

#[utoipa::path(
    delete,
    path = "/api/v0/files/uploads/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let deleted = state.uploads.delete_owned(id, auth.id).await?;
    if !deleted {
        return Err(AppError::NotFound("File not found".to_string()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v0/files/uploads/{id}/download",
    tag = "files",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpAppError> {
    // seed users may download anything, everyone else their own files
    let upload = if auth.is_seed() {
        state.uploads.get(id).await?
    } else {
        state.uploads.get_owned(id, auth.id).await?
    }
    .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let content = state
        .uploads
        .get_content(upload.id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        upload.original_name.replace('"', "")
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_str(&upload.mime_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
        )
        .header(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
        )
        .body(axum::body::Body::from(content))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(
            parse_category("delivery_document").unwrap(),
            FileCategory::DeliveryDocument
        );
        assert_eq!(parse_category("receipt").unwrap(), FileCategory::Receipt);
        assert_eq!(parse_category("other").unwrap(), FileCategory::Other);
        assert!(parse_category("invoice").is_err());
    }
}

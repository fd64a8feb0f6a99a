//! Assignment endpoints

use crate::auth::models::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use hakobu_core::models::{
    AssignmentResponse, AssignmentStatus, DeliveryStatus, DriverAssignmentStatus,
    UpdateAssignmentStatusRequest, UserRole,
};
use hakobu_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v0/deliveries/assignments",
    tag = "deliveries",
    responses(
        (status = 200, description = "Visible assignments", body = [AssignmentResponse])
    )
)]
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<AssignmentResponse>>, HttpAppError> {
    let assignments = match auth.role {
        UserRole::Driver => state.assignments.list_by_driver(auth.id).await?,
        UserRole::Seed => state.assignments.list_all().await?,
        UserRole::Company => state.assignments.list_by_requester(auth.id).await?,
    };

    Ok(Json(
        assignments
            .into_iter()
            .map(AssignmentResponse::from)
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v0/deliveries/assignments/{id}/status",
    tag = "deliveries",
    params(("id" = Uuid, Path, description = "Assignment id")),
    request_body = UpdateAssignmentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = AssignmentResponse),
        (status = 403, description = "Drivers only", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn update_assignment_status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateAssignmentStatusRequest>,
) -> Result<Json<AssignmentResponse>, HttpAppError> {
    if !auth.is_driver() {
        return Err(
            AppError::Forbidden("Only drivers can update assignment status".to_string()).into(),
        );
    }

    let assignment = state
        .assignments
        .get_for_driver(id, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    // The delivery request mirrors the driver's progress.
    let (new_status, request_status) = match body.status {
        DriverAssignmentStatus::InProgress => {
            (AssignmentStatus::InProgress, DeliveryStatus::InProgress)
        }
        DriverAssignmentStatus::Completed => {
            (AssignmentStatus::Completed, DeliveryStatus::Completed)
        }
    };
    let updated = state.assignments.update_status(assignment.id, new_status).await?;
    state
        .deliveries
        .update_status(updated.delivery_request_id, request_status)
        .await?;

    tracing::info!(
        assignment_id = %updated.id,
        status = %new_status,
        "Assignment status updated"
    );

    Ok(Json(AssignmentResponse::from(updated)))
}

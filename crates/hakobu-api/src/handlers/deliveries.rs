//! Delivery request endpoints
//!
//! Listing and editing are role-scoped: drivers browse the open pool, seed
//! users see and manage everything, companies only their own requests.

use crate::auth::models::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hakobu_core::models::{
    AssignDriverRequest, AssignmentResponse, CreateDeliveryRequestRequest, DeliveryRequest,
    DeliveryRequestResponse, DeliveryStatus, SetDriverRewardRequest, UpdateDeliveryRequestRequest,
    UpdateRequestStatusRequest, UserRole,
};
use hakobu_core::AppError;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Fetch a request the caller is allowed to see (and edit).
async fn get_visible_request(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<DeliveryRequest, AppError> {
    let request = state
        .deliveries
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery request not found".to_string()))?;

    if auth.is_company() && request.requester_id != auth.id {
        // Scoped out of existence rather than admitting the request exists.
        return Err(AppError::NotFound("Delivery request not found".to_string()));
    }

    Ok(request)
}

#[utoipa::path(
    get,
    path = "/api/v0/deliveries/requests",
    tag = "deliveries",
    responses(
        (status = 200, description = "Visible delivery requests", body = [DeliveryRequestResponse])
    )
)]
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<DeliveryRequestResponse>>, HttpAppError> {
    let requests = match auth.role {
        // drivers browse the open pool only
        UserRole::Driver => state.deliveries.list_by_status(DeliveryStatus::Pending).await?,
        UserRole::Seed => state.deliveries.list_all().await?,
        UserRole::Company => state.deliveries.list_by_requester(auth.id).await?,
    };

    Ok(Json(
        requests
            .into_iter()
            .map(DeliveryRequestResponse::from)
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v0/deliveries/requests",
    tag = "deliveries",
    request_body = CreateDeliveryRequestRequest,
    responses(
        (status = 201, description = "Delivery request created", body = DeliveryRequestResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateDeliveryRequestRequest>,
) -> Result<(StatusCode, Json<DeliveryRequestResponse>), HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let created = state.deliveries.create(&request.into_new(auth.id)).await?;
    Ok((StatusCode::CREATED, Json(DeliveryRequestResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/api/v0/deliveries/requests/{id}",
    tag = "deliveries",
    params(("id" = Uuid, Path, description = "Delivery request id")),
    responses(
        (status = 200, description = "Delivery request", body = DeliveryRequestResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryRequestResponse>, HttpAppError> {
    let request = get_visible_request(&state, &auth, id).await?;
    Ok(Json(DeliveryRequestResponse::from(request)))
}

#[utoipa::path(
    patch,
    path = "/api/v0/deliveries/requests/{id}",
    tag = "deliveries",
    params(("id" = Uuid, Path, description = "Delivery request id")),
    request_body = UpdateDeliveryRequestRequest,
    responses(
        (status = 200, description = "Updated delivery request", body = DeliveryRequestResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<UpdateDeliveryRequestRequest>,
) -> Result<Json<DeliveryRequestResponse>, HttpAppError> {
    let request = get_visible_request(&state, &auth, id).await?;
    let updated = state.deliveries.update_fields(request.id, update).await?;
    Ok(Json(DeliveryRequestResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v0/deliveries/requests/{id}",
    tag = "deliveries",
    params(("id" = Uuid, Path, description = "Delivery request id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let request = get_visible_request(&state, &auth, id).await?;
    state.deliveries.delete(request.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v0/deliveries/requests/{id}/accept",
    tag = "deliveries",
    params(("id" = Uuid, Path, description = "Delivery request id")),
    responses(
        (status = 201, description = "Request accepted", body = AssignmentResponse),
        (status = 400, description = "Already accepted", body = ErrorResponse),
        (status = 403, description = "Drivers only", body = ErrorResponse),
        (status = 404, description = "Not found or no longer pending", body = ErrorResponse)
    )
)]
pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<AssignmentResponse>), HttpAppError> {
    if !auth.is_driver() {
        return Err(AppError::Forbidden("Only drivers can accept requests".to_string()).into());
    }

    let request = state
        .deliveries
        .get(id)
        .await?
        .filter(|r| r.status == DeliveryStatus::Pending)
        .ok_or_else(|| {
            AppError::NotFound("Delivery request not found or already accepted".to_string())
        })?;

    if state.assignments.exists_for_driver(request.id, auth.id).await? {
        return Err(AppError::BadRequest("You already accepted this request".to_string()).into());
    }

    let assignment = state.assignments.create(request.id, auth.id, None).await?;
    state
        .deliveries
        .update_status(request.id, DeliveryStatus::Assigned)
        .await?;

    tracing::info!(
        delivery_request_id = %request.id,
        driver_id = %auth.id,
        "Delivery request accepted"
    );

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(assignment))))
}

#[utoipa::path(
    post,
    path = "/api/v0/deliveries/requests/{id}/reward",
    tag = "deliveries",
    params(("id" = Uuid, Path, description = "Delivery request id")),
    request_body = SetDriverRewardRequest,
    responses(
        (status = 200, description = "Reward recorded", body = DeliveryRequestResponse),
        (status = 400, description = "Invalid reward amount", body = ErrorResponse),
        (status = 403, description = "Seed users only", body = ErrorResponse)
    )
)]
pub async fn set_driver_reward(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SetDriverRewardRequest>,
) -> Result<Json<DeliveryRequestResponse>, HttpAppError> {
    if !auth.is_seed() {
        return Err(AppError::Forbidden("Seed users only".to_string()).into());
    }

    if request.driver_reward <= Decimal::ZERO {
        return Err(AppError::InvalidInput("Reward must be a positive amount".to_string()).into());
    }

    let updated = state
        .deliveries
        .set_driver_reward(id, request.driver_reward, auth.id)
        .await?;

    Ok(Json(DeliveryRequestResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/api/v0/deliveries/requests/{id}/assign-driver",
    tag = "deliveries",
    params(("id" = Uuid, Path, description = "Delivery request id")),
    request_body = AssignDriverRequest,
    responses(
        (status = 201, description = "Driver assigned", body = AssignmentResponse),
        (status = 400, description = "Request not assignable or duplicate driver", body = ErrorResponse),
        (status = 403, description = "Seed users or the owning company only", body = ErrorResponse),
        (status = 404, description = "Request or driver not found", body = ErrorResponse)
    )
)]
pub async fn assign_driver(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<AssignDriverRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>), HttpAppError> {
    if auth.is_driver() {
        return Err(AppError::Forbidden("Seed users or companies only".to_string()).into());
    }

    let request = get_visible_request(&state, &auth, id).await?;

    if !matches!(
        request.status,
        DeliveryStatus::Pending | DeliveryStatus::Assigned
    ) {
        return Err(AppError::BadRequest(
            "Completed or cancelled requests cannot be reassigned".to_string(),
        )
        .into());
    }

    let driver = state
        .users
        .get_by_id(body.driver_id)
        .await?
        .filter(|u| u.user_type == UserRole::Driver)
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    // An active assignment for another driver is displaced; the same driver
    // twice is a no-op the client should know about.
    if let Some(existing) = state.assignments.find_active_for_request(request.id).await? {
        if existing.driver_id == driver.id {
            return Err(
                AppError::BadRequest("This driver is already assigned".to_string()).into(),
            );
        }
        state
            .assignments
            .update_status(existing.id, hakobu_core::models::AssignmentStatus::Cancelled)
            .await?;
    }

    let assignment = state
        .assignments
        .create(request.id, driver.id, Some(auth.id))
        .await?;
    state
        .deliveries
        .update_status(request.id, DeliveryStatus::Assigned)
        .await?;

    tracing::info!(
        delivery_request_id = %request.id,
        driver_id = %driver.id,
        assigned_by = %auth.id,
        "Driver assigned to delivery request"
    );

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(assignment))))
}

#[utoipa::path(
    patch,
    path = "/api/v0/deliveries/requests/{id}/status",
    tag = "deliveries",
    params(("id" = Uuid, Path, description = "Delivery request id")),
    request_body = UpdateRequestStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = DeliveryRequestResponse),
        (status = 403, description = "Seed users or the owning company only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_request_status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateRequestStatusRequest>,
) -> Result<Json<DeliveryRequestResponse>, HttpAppError> {
    if auth.is_driver() {
        return Err(AppError::Forbidden("Seed users or companies only".to_string()).into());
    }

    let request = get_visible_request(&state, &auth, id).await?;
    let updated = state.deliveries.update_status(request.id, body.status).await?;
    Ok(Json(DeliveryRequestResponse::from(updated)))
}

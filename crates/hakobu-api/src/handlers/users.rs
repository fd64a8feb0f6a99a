//! Profile and driver endpoints

use crate::auth::models::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use hakobu_core::models::{
    DriverProfileResponse, UpdateDriverProfileRequest, UpdateProfileRequest, UserResponse,
    UserRole,
};
use hakobu_core::AppError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/api/v0/users/profile",
    tag = "users",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, HttpAppError> {
    let user = state
        .users
        .get_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/v0/users/profile",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let user = state
        .users
        .update_profile(auth.id, request.username, request.phone_number)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v0/users/driver-profile",
    tag = "users",
    responses(
        (status = 200, description = "Caller's driver profile", body = DriverProfileResponse),
        (status = 403, description = "Not a driver", body = ErrorResponse)
    )
)]
pub async fn get_driver_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<DriverProfileResponse>, HttpAppError> {
    if !auth.is_driver() {
        return Err(AppError::Forbidden("Only drivers have a driver profile".to_string()).into());
    }

    let user = state
        .users
        .get_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let profile = state.driver_profiles.get_or_create(auth.id).await?;

    Ok(Json(DriverProfileResponse::from_parts(profile, &user)))
}

#[utoipa::path(
    patch,
    path = "/api/v0/users/driver-profile",
    tag = "users",
    request_body = UpdateDriverProfileRequest,
    responses(
        (status = 200, description = "Updated driver profile", body = DriverProfileResponse),
        (status = 403, description = "Not a driver", body = ErrorResponse)
    )
)]
pub async fn update_driver_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateDriverProfileRequest>,
) -> Result<Json<DriverProfileResponse>, HttpAppError> {
    if !auth.is_driver() {
        return Err(AppError::Forbidden("Only drivers have a driver profile".to_string()).into());
    }

    let user = state
        .users
        .get_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // ensure the row exists before the partial update
    state.driver_profiles.get_or_create(auth.id).await?;
    let profile = state
        .driver_profiles
        .update(
            auth.id,
            request.license_number,
            request.vehicle_type,
            request.vehicle_number,
            request.is_available,
            request.current_location_lat,
            request.current_location_lng,
        )
        .await?;

    Ok(Json(DriverProfileResponse::from_parts(profile, &user)))
}

#[utoipa::path(
    get,
    path = "/api/v0/users/available-drivers",
    tag = "users",
    responses(
        (status = 200, description = "Available drivers", body = [DriverProfileResponse])
    )
)]
pub async fn available_drivers(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<Vec<DriverProfileResponse>>, HttpAppError> {
    let drivers = state.driver_profiles.list_available().await?;
    Ok(Json(drivers))
}

#[utoipa::path(
    get,
    path = "/api/v0/users/drivers",
    tag = "users",
    responses(
        (status = 200, description = "All drivers", body = [UserResponse]),
        (status = 403, description = "Seed users only", body = ErrorResponse)
    )
)]
pub async fn all_drivers(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<UserResponse>>, HttpAppError> {
    if !auth.is_seed() {
        return Err(AppError::Forbidden("Seed users only".to_string()).into());
    }

    let drivers = state.users.list_by_role(UserRole::Driver).await?;
    Ok(Json(drivers.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/v0/users/drivers/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "Driver user id")),
    responses(
        (status = 204, description = "Driver deleted"),
        (status = 400, description = "Driver has active assignments", body = ErrorResponse),
        (status = 403, description = "Seed users only", body = ErrorResponse),
        (status = 404, description = "Driver not found", body = ErrorResponse)
    )
)]
pub async fn delete_driver(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, HttpAppError> {
    if !auth.is_seed() {
        return Err(AppError::Forbidden("Seed users only".to_string()).into());
    }

    let driver = state
        .users
        .get_by_id(id)
        .await?
        .filter(|u| u.user_type == UserRole::Driver)
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    if state.assignments.has_active_for_driver(driver.id).await? {
        return Err(AppError::BadRequest(
            "Driver has active delivery assignments and cannot be deleted".to_string(),
        )
        .into());
    }

    state.users.delete(driver.id).await?;
    tracing::info!(driver_id = %driver.id, deleted_by = %auth.id, "Driver deleted");

    Ok(axum::http::StatusCode::NO_CONTENT)
}

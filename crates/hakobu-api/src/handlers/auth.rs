//! Registration, login, and token refresh

use crate::auth::jwt::TOKEN_TYPE_REFRESH;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use hakobu_core::models::{
    AccessTokenResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse,
    UserResponse,
};
use hakobu_core::AppError;
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/v0/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .users
        .create_user(
            request.username,
            request.email,
            password_hash,
            request.phone_number,
            request.user_type,
        )
        .await?;

    tracing::info!(user_id = %user.id, role = %user.user_type, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/v0/auth/token",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, HttpAppError> {
    let user = state
        .users
        .get_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()).into());
    }

    let access = state.jwt.issue_access(user.id, user.user_type)?;
    let refresh = state.jwt.issue_refresh(user.id, user.user_type)?;

    Ok(Json(TokenResponse {
        access,
        refresh,
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v0/auth/token/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, HttpAppError> {
    let claims = state.jwt.verify(&request.refresh, TOKEN_TYPE_REFRESH)?;

    // The account may be gone; do not mint tokens for ghosts.
    let user = state
        .users
        .get_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let access = state.jwt.issue_access(user.id, user.user_type)?;
    Ok(Json(AccessTokenResponse { access }))
}

//! Authenticated-user context

use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use hakobu_core::models::{User, UserRole};
use uuid::Uuid;

/// Caller identity extracted from the bearer token and loaded from the
/// database by the auth middleware; stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
}

impl AuthUser {
    pub fn is_driver(&self) -> bool {
        self.role == UserRole::Driver
    }

    pub fn is_company(&self) -> bool {
        self.role == UserRole::Company
    }

    pub fn is_seed(&self) -> bool {
        self.role == UserRole::Seed
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        AuthUser {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.user_type,
            is_verified: user.is_verified,
        }
    }
}

// Extracted from request parts so handlers taking Multipart can still use it.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Missing authentication context".to_string(),
                    details: None,
                    error_type: None,
                    code: "UNAUTHORIZED".to_string(),
                    recoverable: false,
                    suggested_action: Some("Check authentication token".to_string()),
                }),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_role_helpers() {
        let user = User {
            id: Uuid::new_v4(),
            username: "seed".to_string(),
            email: "seed@example.com".to_string(),
            password_hash: String::new(),
            phone_number: String::new(),
            user_type: UserRole::Seed,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let auth = AuthUser::from(&user);
        assert!(auth.is_seed());
        assert!(!auth.is_driver());
        assert!(!auth.is_company());
    }
}

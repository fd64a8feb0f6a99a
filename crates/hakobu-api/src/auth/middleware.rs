//! Bearer-token authentication middleware
//!
//! Validates the access token, loads the account, and stores an `AuthUser`
//! in request extensions for handler extraction.

use crate::auth::jwt::{JwtKeys, TOKEN_TYPE_ACCESS};
use crate::auth::models::AuthUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hakobu_core::AppError;
use hakobu_db::UserRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtKeys>,
    pub users: UserRepository,
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing or malformed Authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let claims = match auth_state.jwt.verify(token, TOKEN_TYPE_ACCESS) {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(err).into_response(),
    };

    // The account may have been deleted since the token was issued.
    let user = match auth_state.users.get_by_id(claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpAppError(AppError::Unauthorized(
                "Account no longer exists".to_string(),
            ))
            .into_response();
        }
        Err(err) => return HttpAppError(err).into_response(),
    };

    request.extensions_mut().insert(AuthUser::from(&user));
    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(value: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/api/v0/users/profile");
        if let Some(value) = value {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(
            bearer_token(&request_with_header(Some("Bearer abc.def.ghi"))),
            Some("abc.def.ghi")
        );
        assert_eq!(bearer_token(&request_with_header(Some("Token abc"))), None);
        assert_eq!(bearer_token(&request_with_header(Some("Bearer "))), None);
        assert_eq!(bearer_token(&request_with_header(None)), None);
    }
}

//! JWT issuing and validation
//!
//! HS256 access/refresh token pair. The refresh token is only good for
//! minting new access tokens; the `token_type` claim keeps the two apart.

use chrono::{Duration, Utc};
use hakobu_core::{models::UserRole, AppError};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

/// Key pair plus expiry policy, built once from config.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_expiry_hours: i64,
    refresh_expiry_days: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, access_expiry_hours: i64, refresh_expiry_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_expiry_hours,
            refresh_expiry_days,
        }
    }

    pub fn issue_access(&self, user_id: Uuid, role: UserRole) -> Result<String, AppError> {
        self.issue(
            user_id,
            role,
            TOKEN_TYPE_ACCESS,
            Duration::hours(self.access_expiry_hours),
        )
    }

    pub fn issue_refresh(&self, user_id: Uuid, role: UserRole) -> Result<String, AppError> {
        self.issue(
            user_id,
            role,
            TOKEN_TYPE_REFRESH,
            Duration::days(self.refresh_expiry_days),
        )
    }

    fn issue(
        &self,
        user_id: Uuid,
        role: UserRole,
        token_type: &str,
        expiry: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            token_type: token_type.to_string(),
            exp: (now + expiry).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decode and validate, checking the token is of the expected type.
    pub fn verify(&self, token: &str, expected_type: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
        if data.claims.token_type != expected_type {
            return Err(AppError::Unauthorized(format!(
                "Expected {} token",
                expected_type
            )));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("0123456789abcdef0123456789abcdef", 24, 30)
    }

    #[test]
    fn test_access_token_round_trip() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue_access(user_id, UserRole::Company).unwrap();
        let claims = keys.verify(&token, TOKEN_TYPE_ACCESS).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Company);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let keys = keys();
        let token = keys.issue_refresh(Uuid::new_v4(), UserRole::Driver).unwrap();
        let err = keys.verify(&token, TOKEN_TYPE_ACCESS).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(keys.verify(&token, TOKEN_TYPE_REFRESH).is_ok());
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let err = keys().verify("not.a.token", TOKEN_TYPE_ACCESS).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_tokens_from_another_secret_are_rejected() {
        let other = JwtKeys::new("ffffffffffffffffffffffffffffffff", 24, 30);
        let token = other.issue_access(Uuid::new_v4(), UserRole::Seed).unwrap();
        assert!(keys().verify(&token, TOKEN_TYPE_ACCESS).is_err());
    }
}

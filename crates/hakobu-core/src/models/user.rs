use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Account role, drives endpoint authorization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Driver,
    Company,
    Seed,
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::Driver => write!(f, "driver"),
            UserRole::Company => write!(f, "company"),
            UserRole::Seed => write!(f, "seed"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(UserRole::Driver),
            "company" => Ok(UserRole::Company),
            "seed" => Ok(UserRole::Seed),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Motorcycle,
    LightTruck,
    Truck,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone_number: String,
    pub user_type: UserRole,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Driver-specific profile, one-to-one with a driver account.
/// Created lazily the first time the driver touches their profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DriverProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub license_number: String,
    pub vehicle_type: Option<VehicleType>,
    pub vehicle_number: String,
    pub is_available: bool,
    pub current_location_lat: Option<Decimal>,
    pub current_location_lng: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub user_type: UserRole,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
            user_type: user.user_type,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

/// Driver profile joined with its user row; also the row shape the driver
/// listing queries select directly into.
#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct DriverProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub license_number: String,
    pub vehicle_type: Option<VehicleType>,
    pub vehicle_number: String,
    pub is_available: bool,
    pub current_location_lat: Option<Decimal>,
    pub current_location_lng: Option<Decimal>,
}

impl DriverProfileResponse {
    pub fn from_parts(profile: DriverProfile, user: &User) -> Self {
        DriverProfileResponse {
            id: profile.id,
            user_id: profile.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            license_number: profile.license_number,
            vehicle_type: profile.vehicle_type,
            vehicle_number: profile.vehicle_number,
            is_available: profile.is_available,
            current_location_lat: profile.current_location_lat,
            current_location_lng: profile.current_location_lng,
        }
    }
}

/// Request DTO for user registration
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
    pub user_type: UserRole,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

/// Partial update of the caller's own profile
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
}

/// Partial update of a driver profile
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDriverProfileRequest {
    pub license_number: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub vehicle_number: Option<String>,
    pub is_available: Option<bool>,
    pub current_location_lat: Option<Decimal>,
    pub current_location_lng: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_round_trip() {
        for role in [UserRole::Driver, UserRole::Company, UserRole::Seed] {
            let parsed: UserRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "taro".to_string(),
            email: "taro@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            phone_number: "090-0000-0000".to_string(),
            user_type: UserRole::Company,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "taro@example.com");
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            username: "taro".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            phone_number: String::new(),
            user_type: UserRole::Driver,
        };
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().contains_key("email"));
        assert!(err.field_errors().contains_key("password"));
    }
}

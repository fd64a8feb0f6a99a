use hakobu_core::{
    models::{DriverProfile, DriverProfileResponse, User, UserRole},
    AppError,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, phone_number, user_type, is_verified, created_at, updated_at";

/// Repository for user accounts
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user. A taken email or username surfaces as InvalidInput.
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "insert"))]
    pub async fn create_user(
        &self,
        username: String,
        email: String,
        password_hash: String,
        phone_number: String,
        user_type: UserRole,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, phone_number, user_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind(&phone_number)
        .bind(user_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::InvalidInput("A user with this email or username already exists".to_string())
            }
            _ => AppError::from(err),
        })?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Partial update of username/phone; untouched fields keep their values.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    pub async fn update_profile(
        &self,
        id: Uuid,
        username: Option<String>,
        phone_number: Option<String>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                phone_number = COALESCE($3, phone_number),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(username)
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_type = $1 ORDER BY created_at DESC",
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Delete a user; uploads cascade, requests cascade. Returns false when
    /// no row matched.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

const PROFILE_COLUMNS: &str = "id, user_id, license_number, vehicle_type, vehicle_number, \
     is_available, current_location_lat, current_location_lng, created_at, updated_at";

/// Repository for driver profiles (one-to-one with driver users)
#[derive(Clone)]
pub struct DriverProfileRepository {
    pool: PgPool,
}

impl DriverProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the driver's profile, creating an empty one on first access.
    #[tracing::instrument(skip(self), fields(db.table = "driver_profiles", db.operation = "upsert"))]
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<DriverProfile, AppError> {
        if let Some(profile) = self.get_by_user(user_id).await? {
            return Ok(profile);
        }

        // Racing first accesses both land here; DO NOTHING keeps one row.
        sqlx::query("INSERT INTO driver_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.get_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::Internal("Driver profile vanished after insert".to_string()))
    }

    #[tracing::instrument(skip(self), fields(db.table = "driver_profiles", db.operation = "select"))]
    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Option<DriverProfile>, AppError> {
        let profile = sqlx::query_as::<Postgres, DriverProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM driver_profiles WHERE user_id = $1",
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    #[tracing::instrument(skip(self), fields(db.table = "driver_profiles", db.operation = "update"))]
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        user_id: Uuid,
        license_number: Option<String>,
        vehicle_type: Option<hakobu_core::models::VehicleType>,
        vehicle_number: Option<String>,
        is_available: Option<bool>,
        current_location_lat: Option<Decimal>,
        current_location_lng: Option<Decimal>,
    ) -> Result<DriverProfile, AppError> {
        let profile = sqlx::query_as::<Postgres, DriverProfile>(&format!(
            r#"
            UPDATE driver_profiles
            SET license_number = COALESCE($2, license_number),
                vehicle_type = COALESCE($3, vehicle_type),
                vehicle_number = COALESCE($4, vehicle_number),
                is_available = COALESCE($5, is_available),
                current_location_lat = COALESCE($6, current_location_lat),
                current_location_lng = COALESCE($7, current_location_lng),
                updated_at = now()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(license_number)
        .bind(vehicle_type)
        .bind(vehicle_number)
        .bind(is_available)
        .bind(current_location_lat)
        .bind(current_location_lng)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver profile not found".to_string()))?;

        Ok(profile)
    }

    /// Available drivers joined with their account rows.
    #[tracing::instrument(skip(self), fields(db.table = "driver_profiles", db.operation = "select"))]
    pub async fn list_available(&self) -> Result<Vec<DriverProfileResponse>, AppError> {
        let drivers = sqlx::query_as::<Postgres, DriverProfileResponse>(
            r#"
            SELECT p.id, p.user_id, u.username, u.email, u.phone_number,
                   p.license_number, p.vehicle_type, p.vehicle_number, p.is_available,
                   p.current_location_lat, p.current_location_lng
            FROM driver_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.is_available = TRUE
            ORDER BY u.username ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }
}

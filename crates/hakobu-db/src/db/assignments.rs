use hakobu_core::{
    models::{Assignment, AssignmentStatus},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const ASSIGNMENT_COLUMNS: &str = "id, delivery_request_id, driver_id, assigned_by, status, \
     pickup_time, delivery_time, driver_rating, requester_rating, notes, created_at, updated_at";

/// Repository for delivery assignments
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "insert"))]
    pub async fn create(
        &self,
        delivery_request_id: Uuid,
        driver_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<Assignment, AppError> {
        let assignment = sqlx::query_as::<Postgres, Assignment>(&format!(
            r#"
            INSERT INTO assignments (delivery_request_id, driver_id, assigned_by, status)
            VALUES ($1, $2, $3, 'accepted')
            RETURNING {ASSIGNMENT_COLUMNS}
            "#,
        ))
        .bind(delivery_request_id)
        .bind(driver_id)
        .bind(assigned_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(assignment)
    }

    /// Whether this driver already holds any assignment for the request,
    /// regardless of its state. Drives the duplicate-acceptance check.
    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "select"))]
    pub async fn exists_for_driver(
        &self,
        delivery_request_id: Uuid,
        driver_id: Uuid,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM assignments WHERE delivery_request_id = $1 AND driver_id = $2)",
        )
        .bind(delivery_request_id)
        .bind(driver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// The request's current active (accepted or in-progress) assignment.
    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "select"))]
    pub async fn find_active_for_request(
        &self,
        delivery_request_id: Uuid,
    ) -> Result<Option<Assignment>, AppError> {
        let assignment = sqlx::query_as::<Postgres, Assignment>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS} FROM assignments
            WHERE delivery_request_id = $1 AND status IN ('accepted', 'in_progress')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        ))
        .bind(delivery_request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }

    /// Whether the driver holds any active assignment. Blocks driver deletion.
    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "select"))]
    pub async fn has_active_for_driver(&self, driver_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM assignments WHERE driver_id = $1 AND status IN ('accepted', 'in_progress'))",
        )
        .bind(driver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "select", db.record_id = %id))]
    pub async fn get_for_driver(
        &self,
        id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<Assignment>, AppError> {
        let assignment = sqlx::query_as::<Postgres, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1 AND driver_id = $2",
        ))
        .bind(id)
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "update", db.record_id = %id))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: AssignmentStatus,
    ) -> Result<Assignment, AppError> {
        let assignment = sqlx::query_as::<Postgres, Assignment>(&format!(
            r#"
            UPDATE assignments
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {ASSIGNMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

        Ok(assignment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "select"))]
    pub async fn list_by_driver(&self, driver_id: Uuid) -> Result<Vec<Assignment>, AppError> {
        let assignments = sqlx::query_as::<Postgres, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE driver_id = $1 ORDER BY created_at DESC",
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "select"))]
    pub async fn list_all(&self) -> Result<Vec<Assignment>, AppError> {
        let assignments = sqlx::query_as::<Postgres, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments ORDER BY created_at DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }

    /// Assignments on requests posted by the given requester.
    #[tracing::instrument(skip(self), fields(db.table = "assignments", db.operation = "select"))]
    pub async fn list_by_requester(&self, requester_id: Uuid) -> Result<Vec<Assignment>, AppError> {
        let assignments = sqlx::query_as::<Postgres, Assignment>(
            r#"
            SELECT a.id, a.delivery_request_id, a.driver_id, a.assigned_by, a.status,
                   a.pickup_time, a.delivery_time, a.driver_rating, a.requester_rating,
                   a.notes, a.created_at, a.updated_at
            FROM assignments a
            JOIN delivery_requests r ON r.id = a.delivery_request_id
            WHERE r.requester_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }
}

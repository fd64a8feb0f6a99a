use hakobu_core::{
    models::{
        DeliveryRequest, DeliveryStatus, NewDeliveryRequest, UpdateDeliveryRequestRequest,
    },
    AppError,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const REQUEST_COLUMNS: &str = "id, requester_id, title, description, \
     sender_name, sender_phone, sender_address, sender_lat, sender_lng, \
     recipient_name, recipient_phone, recipient_address, recipient_lat, recipient_lng, \
     item_name, item_quantity, item_weight, item_size, \
     delivery_date, delivery_time, special_instructions, \
     request_amount, estimated_fee, final_fee, driver_reward, seed_user_id, \
     status, created_at, updated_at";

/// Repository for delivery requests
#[derive(Clone)]
pub struct DeliveryRequestRepository {
    pool: PgPool,
}

impl DeliveryRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new request. Status always starts at pending.
    #[tracing::instrument(skip(self, new), fields(db.table = "delivery_requests", db.operation = "insert"))]
    pub async fn create(&self, new: &NewDeliveryRequest) -> Result<DeliveryRequest, AppError> {
        let request = sqlx::query_as::<Postgres, DeliveryRequest>(&format!(
            r#"
            INSERT INTO delivery_requests (
                requester_id, title, description,
                sender_name, sender_phone, sender_address, sender_lat, sender_lng,
                recipient_name, recipient_phone, recipient_address, recipient_lat, recipient_lng,
                item_name, item_quantity, item_weight, item_size,
                delivery_date, delivery_time, special_instructions, request_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21)
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(new.requester_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.sender_name)
        .bind(&new.sender_phone)
        .bind(&new.sender_address)
        .bind(new.sender_lat)
        .bind(new.sender_lng)
        .bind(&new.recipient_name)
        .bind(&new.recipient_phone)
        .bind(&new.recipient_address)
        .bind(new.recipient_lat)
        .bind(new.recipient_lng)
        .bind(&new.item_name)
        .bind(new.item_quantity)
        .bind(new.item_weight)
        .bind(&new.item_size)
        .bind(new.delivery_date)
        .bind(&new.delivery_time)
        .bind(&new.special_instructions)
        .bind(new.request_amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    #[tracing::instrument(skip(self), fields(db.table = "delivery_requests", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<DeliveryRequest>, AppError> {
        let request = sqlx::query_as::<Postgres, DeliveryRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM delivery_requests WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    #[tracing::instrument(skip(self), fields(db.table = "delivery_requests", db.operation = "select"))]
    pub async fn list_all(&self) -> Result<Vec<DeliveryRequest>, AppError> {
        let requests = sqlx::query_as::<Postgres, DeliveryRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM delivery_requests ORDER BY created_at DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    #[tracing::instrument(skip(self), fields(db.table = "delivery_requests", db.operation = "select"))]
    pub async fn list_by_status(
        &self,
        status: DeliveryStatus,
    ) -> Result<Vec<DeliveryRequest>, AppError> {
        let requests = sqlx::query_as::<Postgres, DeliveryRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM delivery_requests WHERE status = $1 ORDER BY created_at DESC",
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    #[tracing::instrument(skip(self), fields(db.table = "delivery_requests", db.operation = "select"))]
    pub async fn list_by_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<DeliveryRequest>, AppError> {
        let requests = sqlx::query_as::<Postgres, DeliveryRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM delivery_requests WHERE requester_id = $1 ORDER BY created_at DESC",
        ))
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Partial field update; untouched fields keep their values.
    #[tracing::instrument(skip(self, update), fields(db.table = "delivery_requests", db.operation = "update", db.record_id = %id))]
    pub async fn update_fields(
        &self,
        id: Uuid,
        update: UpdateDeliveryRequestRequest,
    ) -> Result<DeliveryRequest, AppError> {
        let request = sqlx::query_as::<Postgres, DeliveryRequest>(&format!(
            r#"
            UPDATE delivery_requests
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                sender_name = COALESCE($4, sender_name),
                sender_phone = COALESCE($5, sender_phone),
                sender_address = COALESCE($6, sender_address),
                recipient_name = COALESCE($7, recipient_name),
                recipient_phone = COALESCE($8, recipient_phone),
                recipient_address = COALESCE($9, recipient_address),
                item_name = COALESCE($10, item_name),
                item_quantity = COALESCE($11, item_quantity),
                item_weight = COALESCE($12, item_weight),
                item_size = COALESCE($13, item_size),
                delivery_date = COALESCE($14, delivery_date),
                delivery_time = COALESCE($15, delivery_time),
                special_instructions = COALESCE($16, special_instructions),
                request_amount = COALESCE($17, request_amount),
                estimated_fee = COALESCE($18, estimated_fee),
                final_fee = COALESCE($19, final_fee),
                updated_at = now()
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.sender_name)
        .bind(update.sender_phone)
        .bind(update.sender_address)
        .bind(update.recipient_name)
        .bind(update.recipient_phone)
        .bind(update.recipient_address)
        .bind(update.item_name)
        .bind(update.item_quantity)
        .bind(update.item_weight)
        .bind(update.item_size)
        .bind(update.delivery_date)
        .bind(update.delivery_time)
        .bind(update.special_instructions)
        .bind(update.request_amount)
        .bind(update.estimated_fee)
        .bind(update.final_fee)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery request not found".to_string()))?;

        Ok(request)
    }

    #[tracing::instrument(skip(self), fields(db.table = "delivery_requests", db.operation = "update", db.record_id = %id))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
    ) -> Result<DeliveryRequest, AppError> {
        let request = sqlx::query_as::<Postgres, DeliveryRequest>(&format!(
            r#"
            UPDATE delivery_requests
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery request not found".to_string()))?;

        Ok(request)
    }

    /// Record the reward amount and the seed user who set it.
    #[tracing::instrument(skip(self), fields(db.table = "delivery_requests", db.operation = "update", db.record_id = %id))]
    pub async fn set_driver_reward(
        &self,
        id: Uuid,
        driver_reward: Decimal,
        seed_user_id: Uuid,
    ) -> Result<DeliveryRequest, AppError> {
        let request = sqlx::query_as::<Postgres, DeliveryRequest>(&format!(
            r#"
            UPDATE delivery_requests
            SET driver_reward = $2, seed_user_id = $3, updated_at = now()
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(driver_reward)
        .bind(seed_user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery request not found".to_string()))?;

        Ok(request)
    }

    #[tracing::instrument(skip(self), fields(db.table = "delivery_requests", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM delivery_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

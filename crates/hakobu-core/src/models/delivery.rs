use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Assigned => write!(f, "assigned"),
            DeliveryStatus::InProgress => write!(f, "in_progress"),
            DeliveryStatus::Completed => write!(f, "completed"),
            DeliveryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "assigned" => Ok(DeliveryStatus::Assigned),
            "in_progress" => Ok(DeliveryStatus::InProgress),
            "completed" => Ok(DeliveryStatus::Completed),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid delivery status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeliveryRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub title: String,
    pub description: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub sender_lat: Option<Decimal>,
    pub sender_lng: Option<Decimal>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_lat: Option<Decimal>,
    pub recipient_lng: Option<Decimal>,
    pub item_name: String,
    pub item_quantity: i32,
    pub item_weight: Option<Decimal>,
    pub item_size: String,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: String,
    pub special_instructions: String,
    pub request_amount: Option<Decimal>,
    pub estimated_fee: Option<Decimal>,
    pub final_fee: Option<Decimal>,
    pub driver_reward: Option<Decimal>,
    pub seed_user_id: Option<Uuid>,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert draft for a delivery request. Built either from a client payload
/// or by materializing an extracted document.
#[derive(Debug, Clone)]
pub struct NewDeliveryRequest {
    pub requester_id: Uuid,
    pub title: String,
    pub description: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub sender_lat: Option<Decimal>,
    pub sender_lng: Option<Decimal>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_lat: Option<Decimal>,
    pub recipient_lng: Option<Decimal>,
    pub item_name: String,
    pub item_quantity: i32,
    pub item_weight: Option<Decimal>,
    pub item_size: String,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: String,
    pub special_instructions: String,
    pub request_amount: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryRequestResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub title: String,
    pub description: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub sender_lat: Option<Decimal>,
    pub sender_lng: Option<Decimal>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_lat: Option<Decimal>,
    pub recipient_lng: Option<Decimal>,
    pub item_name: String,
    pub item_quantity: i32,
    pub item_weight: Option<Decimal>,
    pub item_size: String,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: String,
    pub special_instructions: String,
    pub request_amount: Option<Decimal>,
    pub estimated_fee: Option<Decimal>,
    pub final_fee: Option<Decimal>,
    pub driver_reward: Option<Decimal>,
    pub seed_user_id: Option<Uuid>,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeliveryRequest> for DeliveryRequestResponse {
    fn from(req: DeliveryRequest) -> Self {
        DeliveryRequestResponse {
            id: req.id,
            requester_id: req.requester_id,
            title: req.title,
            description: req.description,
            sender_name: req.sender_name,
            sender_phone: req.sender_phone,
            sender_address: req.sender_address,
            sender_lat: req.sender_lat,
            sender_lng: req.sender_lng,
            recipient_name: req.recipient_name,
            recipient_phone: req.recipient_phone,
            recipient_address: req.recipient_address,
            recipient_lat: req.recipient_lat,
            recipient_lng: req.recipient_lng,
            item_name: req.item_name,
            item_quantity: req.item_quantity,
            item_weight: req.item_weight,
            item_size: req.item_size,
            delivery_date: req.delivery_date,
            delivery_time: req.delivery_time,
            special_instructions: req.special_instructions,
            request_amount: req.request_amount,
            estimated_fee: req.estimated_fee,
            final_fee: req.final_fee,
            driver_reward: req.driver_reward,
            seed_user_id: req.seed_user_id,
            status: req.status,
            created_at: req.created_at,
            updated_at: req.updated_at,
        }
    }
}

/// Request DTO for creating a delivery request by hand
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateDeliveryRequestRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "Sender name must be 1-100 characters"))]
    pub sender_name: String,
    #[serde(default)]
    pub sender_phone: String,
    #[serde(default)]
    pub sender_address: String,
    pub sender_lat: Option<Decimal>,
    pub sender_lng: Option<Decimal>,
    #[validate(length(min = 1, max = 100, message = "Recipient name must be 1-100 characters"))]
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_phone: String,
    #[serde(default)]
    pub recipient_address: String,
    pub recipient_lat: Option<Decimal>,
    pub recipient_lng: Option<Decimal>,
    #[validate(length(min = 1, max = 200, message = "Item name must be 1-200 characters"))]
    pub item_name: String,
    #[serde(default = "default_quantity")]
    pub item_quantity: i32,
    pub item_weight: Option<Decimal>,
    #[serde(default)]
    pub item_size: String,
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_time: String,
    #[serde(default)]
    pub special_instructions: String,
    pub request_amount: Option<Decimal>,
}

fn default_quantity() -> i32 {
    1
}

impl CreateDeliveryRequestRequest {
    pub fn into_new(self, requester_id: Uuid) -> NewDeliveryRequest {
        NewDeliveryRequest {
            requester_id,
            title: self.title,
            description: self.description,
            sender_name: self.sender_name,
            sender_phone: self.sender_phone,
            sender_address: self.sender_address,
            sender_lat: self.sender_lat,
            sender_lng: self.sender_lng,
            recipient_name: self.recipient_name,
            recipient_phone: self.recipient_phone,
            recipient_address: self.recipient_address,
            recipient_lat: self.recipient_lat,
            recipient_lng: self.recipient_lng,
            item_name: self.item_name,
            item_quantity: self.item_quantity,
            item_weight: self.item_weight,
            item_size: self.item_size,
            delivery_date: self.delivery_date,
            delivery_time: self.delivery_time,
            special_instructions: self.special_instructions,
            request_amount: self.request_amount,
        }
    }
}

/// Partial update of a delivery request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeliveryRequestRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sender_name: Option<String>,
    pub sender_phone: Option<String>,
    pub sender_address: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub recipient_address: Option<String>,
    pub item_name: Option<String>,
    pub item_quantity: Option<i32>,
    pub item_weight: Option<Decimal>,
    pub item_size: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
    pub special_instructions: Option<String>,
    pub request_amount: Option<Decimal>,
    pub estimated_fee: Option<Decimal>,
    pub final_fee: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRequestStatusRequest {
    pub status: DeliveryStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetDriverRewardRequest {
    pub driver_reward: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_round_trip() {
        for status in [
            DeliveryStatus::Pending,
            DeliveryStatus::Assigned,
            DeliveryStatus::InProgress,
            DeliveryStatus::Completed,
            DeliveryStatus::Cancelled,
        ] {
            let parsed: DeliveryStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_create_request_defaults_quantity() {
        let json = r#"{
            "title": "Morning route",
            "sender_name": "Hanako Sato",
            "recipient_name": "Taro Yamada",
            "item_name": "Boxes"
        }"#;
        let request: CreateDeliveryRequestRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.item_quantity, 1);
        assert!(request.delivery_date.is_none());

        let new = request.into_new(Uuid::new_v4());
        assert_eq!(new.item_quantity, 1);
        assert_eq!(new.title, "Morning route");
    }
}

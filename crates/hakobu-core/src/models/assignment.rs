use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Assignment lifecycle. `Cancelled` is set when a seed user or company
/// reassigns a request to a different driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Accepted,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

impl Display for AssignmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssignmentStatus::Accepted => write!(f, "accepted"),
            AssignmentStatus::InProgress => write!(f, "in_progress"),
            AssignmentStatus::Completed => write!(f, "completed"),
            AssignmentStatus::Rejected => write!(f, "rejected"),
            AssignmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub delivery_request_id: Uuid,
    pub driver_id: Uuid,
    pub assigned_by: Option<Uuid>,
    pub status: AssignmentStatus,
    pub pickup_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub driver_rating: Option<i32>,
    pub requester_rating: Option<i32>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub delivery_request_id: Uuid,
    pub driver_id: Uuid,
    pub assigned_by: Option<Uuid>,
    pub status: AssignmentStatus,
    pub pickup_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub driver_rating: Option<i32>,
    pub requester_rating: Option<i32>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl From<Assignment> for AssignmentResponse {
    fn from(a: Assignment) -> Self {
        AssignmentResponse {
            id: a.id,
            delivery_request_id: a.delivery_request_id,
            driver_id: a.driver_id,
            assigned_by: a.assigned_by,
            status: a.status,
            pickup_time: a.pickup_time,
            delivery_time: a.delivery_time,
            driver_rating: a.driver_rating,
            requester_rating: a.requester_rating,
            notes: a.notes,
            created_at: a.created_at,
        }
    }
}

/// Drivers may only report these two transitions; everything else is set
/// by the brokering side.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DriverAssignmentStatus {
    InProgress,
    Completed,
}

impl From<DriverAssignmentStatus> for AssignmentStatus {
    fn from(s: DriverAssignmentStatus) -> Self {
        match s {
            DriverAssignmentStatus::InProgress => AssignmentStatus::InProgress,
            DriverAssignmentStatus::Completed => AssignmentStatus::Completed,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAssignmentStatusRequest {
    pub status: DriverAssignmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_status_subset_maps_onto_assignment_status() {
        assert_eq!(
            AssignmentStatus::from(DriverAssignmentStatus::InProgress),
            AssignmentStatus::InProgress
        );
        assert_eq!(
            AssignmentStatus::from(DriverAssignmentStatus::Completed),
            AssignmentStatus::Completed
        );
    }

    #[test]
    fn test_driver_status_rejects_other_values() {
        assert!(serde_json::from_str::<UpdateAssignmentStatusRequest>(
            r#"{"status": "cancelled"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<UpdateAssignmentStatusRequest>(
            r#"{"status": "in_progress"}"#
        )
        .is_ok());
    }
}

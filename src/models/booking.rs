use crate::entities::{BookingStatus, booking_entity as bookings};
use crate::models::ConsultantResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Number or numeric string.
    #[schema(value_type = Option<i64>, example = 1)]
    pub consultant_id: Option<serde_json::Value>,
    /// `YYYY-MM-DD` or RFC 3339.
    #[schema(example = "2025-11-03")]
    pub date: Option<String>,
    #[schema(example = "10:00 AM")]
    pub time_slot: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub id: i64,
    pub user_id: i64,
    pub consultant_id: i64,
    pub date: DateTime<Utc>,
    pub time_slot: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultant: Option<ConsultantResponse>,
}

impl From<bookings::Model> for BookingResponse {
    fn from(m: bookings::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            consultant_id: m.consultant_id,
            date: m.date,
            time_slot: m.time_slot,
            status: m.status,
            created_at: m.created_at,
            consultant: None,
        }
    }
}

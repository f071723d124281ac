use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "payment_gateway", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentGateway {
    Cash,
    Razorpay,
    Phonepe,
    Upi,
    Card,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DinnerEventEntity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub venue: String,
    pub city: String,
    pub event_date: chrono::DateTime<chrono::Utc>,
    /// Smallest currency unit.
    pub price: i64,
    pub capacity: i32,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl DinnerEventEntity {
    pub fn is_open_for_booking(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.is_active && self.event_date > now
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub seats: i32,
    pub amount: i64,
    pub payment_gateway: PaymentGateway,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub transaction_id: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

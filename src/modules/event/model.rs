use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::{
    event::schema::{BookingEntity, DinnerEventEntity, PaymentGateway, PaymentStatus},
    user::schema::Gender,
};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct EventQuery {
    #[validate(length(min = 1, max = 80, message = "City must be between 1 and 80 characters"))]
    pub city: Option<String>,
    /// Defaults to `true`.
    pub upcoming: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventModel {
    #[validate(length(min = 1, max = 120, message = "Title must be between 1 and 120 characters"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Venue must be between 1 and 200 characters"))]
    pub venue: String,
    #[validate(length(min = 1, max = 80, message = "City must be between 1 and 80 characters"))]
    pub city: String,
    pub event_date: chrono::DateTime<chrono::Utc>,
    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price: i64,
    #[validate(range(min = 1, max = 1000, message = "Capacity must be between 1 and 1000"))]
    pub capacity: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventModel {
    #[validate(length(min = 1, max = 120, message = "Title must be between 1 and 120 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Venue must be between 1 and 200 characters"))]
    pub venue: Option<String>,
    #[validate(length(min = 1, max = 80, message = "City must be between 1 and 80 characters"))]
    pub city: Option<String>,
    pub event_date: Option<chrono::DateTime<chrono::Utc>>,
    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price: Option<i64>,
    #[validate(range(min = 1, max = 1000, message = "Capacity must be between 1 and 1000"))]
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateEventModel {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.venue.is_none()
            && self.city.is_none()
            && self.event_date.is_none()
            && self.price.is_none()
            && self.capacity.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingModel {
    pub payment_gateway: PaymentGateway,
    pub payment_status: Option<PaymentStatus>,
    #[validate(range(min = 1, max = 10, message = "Seats must be between 1 and 10"))]
    pub seats: Option<i32>,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentModel {
    #[validate(length(min = 1, message = "Order id is required"))]
    pub gateway_order_id: String,
    #[validate(length(min = 1, message = "Payment id is required"))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1, message = "Signature is required"))]
    pub gateway_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct PhonePeCallback {
    /// Base64 encoded JSON payload.
    pub response: String,
}

pub struct NewBooking {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub seats: i32,
    pub payment_gateway: PaymentGateway,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
}

pub enum BookingOutcome {
    Created(BookingEntity),
    EventNotFound,
    Closed,
    AlreadyBooked,
    SoldOut { seats_left: i64 },
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventWithSeats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: DinnerEventEntity,
    pub booked_seats: i64,
}

impl EventWithSeats {
    pub fn seats_left(&self) -> i64 {
        (i64::from(self.event.capacity) - self.booked_seats).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: DinnerEventEntity,
    pub booked_seats: i64,
    pub seats_left: i64,
}

impl From<EventWithSeats> for EventResponse {
    fn from(value: EventWithSeats) -> Self {
        let seats_left = value.seats_left();
        EventResponse { event: value.event, booked_seats: value.booked_seats, seats_left }
    }
}

#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub my_booking: Option<BookingEntity>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct BookingWithEvent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: BookingEntity,
    pub event_title: String,
    pub event_venue: String,
    pub event_city: String,
    pub event_date: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendeeResponse {
    pub user_id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub university_name: Option<String>,
    pub avatar_url: Option<String>,
    pub seats: i32,
    pub booked_at: chrono::DateTime<chrono::Utc>,
}

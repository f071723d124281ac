use uuid::Uuid;

use crate::{
    api::error,
    modules::event::{
        model::{
            AttendeeResponse, BookingOutcome, BookingWithEvent, CreateEventModel, EventWithSeats,
            NewBooking, UpdateEventModel,
        },
        schema::{BookingEntity, DinnerEventEntity, PaymentStatus},
    },
};

#[async_trait::async_trait]
pub trait EventRepository {
    /// Active events only, soonest first.
    async fn find_events(
        &self,
        city: Option<&str>,
        upcoming_only: bool,
    ) -> Result<Vec<EventWithSeats>, error::SystemError>;

    async fn find_event(&self, id: &Uuid) -> Result<Option<EventWithSeats>, error::SystemError>;

    async fn create_event(
        &self,
        created_by: &Uuid,
        event: &CreateEventModel,
    ) -> Result<DinnerEventEntity, error::SystemError>;

    async fn update_event(
        &self,
        id: &Uuid,
        event: &UpdateEventModel,
    ) -> Result<Option<DinnerEventEntity>, error::SystemError>;

    async fn find_booking(&self, id: &Uuid) -> Result<Option<BookingEntity>, error::SystemError>;

    async fn find_booking_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<BookingEntity>, error::SystemError>;

    async fn find_active_booking(
        &self,
        event_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<BookingEntity>, error::SystemError>;

    async fn find_user_bookings(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<BookingWithEvent>, error::SystemError>;

    async fn find_attendees(
        &self,
        event_id: &Uuid,
    ) -> Result<Vec<AttendeeResponse>, error::SystemError>;

    async fn update_payment(
        &self,
        booking_id: &Uuid,
        status: PaymentStatus,
        gateway_payment_id: Option<&str>,
    ) -> Result<Option<BookingEntity>, error::SystemError>;

    /// Only a confirmed booking of `user_id` for an event that has not started yet.
    async fn cancel_booking(
        &self,
        booking_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<BookingEntity>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait EventRepo: EventRepository + Send + Sync {
    /// Locks the event row, then checks it is open, the user holds no active booking
    /// and enough seats are left before inserting. Amount is `price * seats`.
    async fn create_booking_atomic(
        &self,
        booking: &NewBooking,
    ) -> Result<BookingOutcome, error::SystemError>;
}

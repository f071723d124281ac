use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::event::{
        model::{
            AttendeeResponse, BookingOutcome, BookingWithEvent, CreateBookingModel,
            CreateEventModel, EventDetailResponse, EventQuery, EventResponse, NewBooking,
            PhonePeCallback, UpdateEventModel, VerifyPaymentModel,
        },
        payment::{
            PaymentConfig, PhonePePayload, resolve_payment_status, transaction_id,
            verify_phonepe_checksum, verify_razorpay_signature,
        },
        repository::EventRepo,
        schema::{BookingEntity, BookingStatus, DinnerEventEntity, PaymentGateway, PaymentStatus},
    },
};

/// Partial unique index allowing one confirmed booking per user and event.
const ACTIVE_BOOKING_CONSTRAINT: &str = "bookings_active_key";

#[derive(Clone)]
pub struct EventService<E>
where
    E: EventRepo + Send + Sync,
{
    event_repo: Arc<E>,
    payments: PaymentConfig,
}

impl<E> EventService<E>
where
    E: EventRepo + Send + Sync,
{
    pub fn with_dependencies(event_repo: Arc<E>, payments: PaymentConfig) -> Self {
        EventService { event_repo, payments }
    }

    pub async fn list_events(
        &self,
        query: EventQuery,
    ) -> Result<Vec<EventResponse>, error::SystemError> {
        let city = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let events = self
            .event_repo
            .find_events(city, query.upcoming.unwrap_or(true))
            .await?;
        Ok(events.into_iter().map(EventResponse::from).collect())
    }

    pub async fn get_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<EventDetailResponse, error::SystemError> {
        let (event, my_booking) = tokio::try_join!(
            self.event_repo.find_event(&event_id),
            self.event_repo.find_active_booking(&event_id, &user_id),
        )?;
        let event = event.ok_or_else(|| error::SystemError::not_found("Event not found"))?;

        Ok(EventDetailResponse { event: EventResponse::from(event), my_booking })
    }

    pub async fn create_event(
        &self,
        admin_id: Uuid,
        model: CreateEventModel,
    ) -> Result<DinnerEventEntity, error::SystemError> {
        if model.event_date <= chrono::Utc::now() {
            return Err(error::SystemError::bad_request("Event date must be in the future"));
        }

        let event = self.event_repo.create_event(&admin_id, &model).await?;
        log::info!("Admin {admin_id} created dinner event {}", event.id);
        Ok(event)
    }

    pub async fn update_event(
        &self,
        event_id: Uuid,
        model: UpdateEventModel,
    ) -> Result<DinnerEventEntity, error::SystemError> {
        if model.is_empty() {
            return Err(error::SystemError::bad_request("No fields to update"));
        }

        let current = self
            .event_repo
            .find_event(&event_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Event not found"))?;

        if let Some(capacity) = model.capacity {
            if i64::from(capacity) < current.booked_seats {
                return Err(error::SystemError::conflict(format!(
                    "Capacity cannot be lower than the {} seats already booked",
                    current.booked_seats
                )));
            }
        }

        self.event_repo
            .update_event(&event_id, &model)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Event not found"))
    }

    pub async fn create_booking(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        model: CreateBookingModel,
    ) -> Result<BookingEntity, error::SystemError> {
        let mut payment_status = resolve_payment_status(model.payment_gateway, model.payment_status);

        if model.payment_gateway == PaymentGateway::Razorpay {
            if let Some(signature) = model.gateway_signature.as_deref() {
                let (Some(order_id), Some(payment_id)) =
                    (model.gateway_order_id.as_deref(), model.gateway_payment_id.as_deref())
                else {
                    return Err(error::SystemError::bad_request(
                        "Order id and payment id are required with a signature",
                    ));
                };
                self.check_razorpay(order_id, payment_id, signature)?;
                payment_status = PaymentStatus::Completed;
            }
        }

        let booking = NewBooking {
            event_id,
            user_id,
            seats: model.seats.unwrap_or(1),
            payment_gateway: model.payment_gateway,
            payment_status,
            transaction_id: transaction_id(&user_id, chrono::Utc::now()),
            gateway_order_id: model.gateway_order_id,
            gateway_payment_id: model.gateway_payment_id,
        };

        let outcome = self.event_repo.create_booking_atomic(&booking).await.map_err(|e| match e {
            error::SystemError::UniqueViolation(Some(meta))
                if meta.constraint.as_deref() == Some(ACTIVE_BOOKING_CONSTRAINT) =>
            {
                error::SystemError::conflict("You already have a booking for this event")
            }
            other => other,
        })?;

        match outcome {
            BookingOutcome::Created(booking) => {
                log::info!(
                    "User {user_id} booked {} seat(s) for event {event_id} ({:?}, {:?})",
                    booking.seats,
                    booking.payment_gateway,
                    booking.payment_status
                );
                Ok(booking)
            }
            BookingOutcome::EventNotFound => Err(error::SystemError::not_found("Event not found")),
            BookingOutcome::Closed => {
                Err(error::SystemError::bad_request("Event is not open for booking"))
            }
            BookingOutcome::AlreadyBooked => {
                Err(error::SystemError::conflict("You already have a booking for this event"))
            }
            BookingOutcome::SoldOut { seats_left } => Err(error::SystemError::conflict(format!(
                "Not enough seats left ({seats_left} available)"
            ))),
        }
    }

    fn check_razorpay(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), error::SystemError> {
        if !verify_razorpay_signature(&self.payments.razorpay_key_secret, order_id, payment_id, signature)
        {
            log::warn!("Rejected Razorpay signature for order {order_id}");
            return Err(error::SystemError::bad_request("Invalid payment signature"));
        }
        Ok(())
    }

    async fn owned_booking(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingEntity, error::SystemError> {
        match self.event_repo.find_booking(&booking_id).await? {
            Some(b) if b.user_id == user_id => Ok(b),
            _ => Err(error::SystemError::not_found("Booking not found")),
        }
    }

    pub async fn verify_payment(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        model: VerifyPaymentModel,
    ) -> Result<BookingEntity, error::SystemError> {
        let booking = self.owned_booking(user_id, booking_id).await?;

        if booking.payment_gateway != PaymentGateway::Razorpay {
            return Err(error::SystemError::bad_request("Booking was not paid through Razorpay"));
        }
        if booking.booking_status == BookingStatus::Cancelled {
            return Err(error::SystemError::conflict("Booking is cancelled"));
        }
        if let Some(order_id) = booking.gateway_order_id.as_deref() {
            if order_id != model.gateway_order_id {
                return Err(error::SystemError::bad_request("Order id does not match the booking"));
            }
        }

        self.check_razorpay(&model.gateway_order_id, &model.gateway_payment_id, &model.gateway_signature)?;

        if booking.payment_status == PaymentStatus::Completed {
            return Ok(booking);
        }

        self.event_repo
            .update_payment(&booking_id, PaymentStatus::Completed, Some(&model.gateway_payment_id))
            .await?
            .ok_or_else(|| error::SystemError::not_found("Booking not found"))
    }

    pub async fn phonepe_callback(
        &self,
        x_verify: &str,
        callback: PhonePeCallback,
    ) -> Result<BookingEntity, error::SystemError> {
        if !verify_phonepe_checksum(
            &callback.response,
            x_verify,
            &self.payments.phonepe_salt_key,
            &self.payments.phonepe_salt_index,
        ) {
            log::warn!("Rejected PhonePe callback with invalid checksum");
            return Err(error::SystemError::unauthorized("Invalid checksum"));
        }

        let payload = PhonePePayload::decode(&callback.response)?;
        let booking = self
            .event_repo
            .find_booking_by_transaction(&payload.data.merchant_transaction_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Booking not found"))?;

        let status = payload.status();
        log::info!(
            "PhonePe callback for {}: {} -> {status:?}",
            payload.data.merchant_transaction_id,
            payload.code
        );

        self.event_repo
            .update_payment(&booking.id, status, payload.data.transaction_id.as_deref())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Booking not found"))
    }

    pub async fn list_bookings(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BookingWithEvent>, error::SystemError> {
        self.event_repo.find_user_bookings(&user_id).await
    }

    pub async fn cancel_booking(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingEntity, error::SystemError> {
        let booking = self.owned_booking(user_id, booking_id).await?;
        if booking.booking_status == BookingStatus::Cancelled {
            return Err(error::SystemError::conflict("Booking is already cancelled"));
        }

        let event = self
            .event_repo
            .find_event(&booking.event_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Event not found"))?;
        if event.event.event_date <= chrono::Utc::now() {
            return Err(error::SystemError::bad_request("Bookings can only be cancelled before the event"));
        }

        let cancelled = self
            .event_repo
            .cancel_booking(&booking_id, &user_id)
            .await?
            .ok_or_else(|| error::SystemError::conflict("Booking can no longer be cancelled"))?;

        log::info!("User {user_id} cancelled booking {booking_id}");
        Ok(cancelled)
    }

    pub async fn get_attendees(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<AttendeeResponse>, error::SystemError> {
        if self.event_repo.find_event(&event_id).await?.is_none() {
            return Err(error::SystemError::not_found("Event not found"));
        }
        self.event_repo.find_attendees(&event_id).await
    }
}

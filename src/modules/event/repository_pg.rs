use uuid::Uuid;

use crate::{
    api::error,
    modules::event::{
        model::{
            AttendeeResponse, BookingOutcome, BookingWithEvent, CreateEventModel, EventWithSeats,
            NewBooking, UpdateEventModel,
        },
        repository::{EventRepo, EventRepository},
        schema::{BookingEntity, DinnerEventEntity, PaymentStatus},
    },
};

const BOOKED_SEATS: &str = r#"
    COALESCE((
        SELECT SUM(b.seats) FROM bookings b
        WHERE b.event_id = e.id AND b.booking_status = 'confirmed'
    ), 0)::BIGINT AS booked_seats
"#;

#[derive(Clone)]
pub struct EventRepositoryPg {
    pool: sqlx::PgPool,
}

impl EventRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventRepository for EventRepositoryPg {
    async fn find_events(
        &self,
        city: Option<&str>,
        upcoming_only: bool,
    ) -> Result<Vec<EventWithSeats>, error::SystemError> {
        let sql = format!(
            r#"
            SELECT e.*, {BOOKED_SEATS}
            FROM dinner_events e
            WHERE e.is_active
            AND ($1::text IS NULL OR lower(e.city) = lower($1))
            AND (NOT $2 OR e.event_date > NOW())
            ORDER BY e.event_date ASC
            "#
        );

        let events = sqlx::query_as::<_, EventWithSeats>(&sql)
            .bind(city)
            .bind(upcoming_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn find_event(&self, id: &Uuid) -> Result<Option<EventWithSeats>, error::SystemError> {
        let sql = format!("SELECT e.*, {BOOKED_SEATS} FROM dinner_events e WHERE e.id = $1");
        let event = sqlx::query_as::<_, EventWithSeats>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    async fn create_event(
        &self,
        created_by: &Uuid,
        event: &CreateEventModel,
    ) -> Result<DinnerEventEntity, error::SystemError> {
        let event = sqlx::query_as::<_, DinnerEventEntity>(
            r#"
            INSERT INTO dinner_events
                (id, title, description, venue, city, event_date, price, capacity, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(&event.city)
        .bind(event.event_date)
        .bind(event.price)
        .bind(event.capacity)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn update_event(
        &self,
        id: &Uuid,
        event: &UpdateEventModel,
    ) -> Result<Option<DinnerEventEntity>, error::SystemError> {
        let event = sqlx::query_as::<_, DinnerEventEntity>(
            r#"
            UPDATE dinner_events
            SET
                title       = COALESCE($2, title),
                description = COALESCE($3, description),
                venue       = COALESCE($4, venue),
                city        = COALESCE($5, city),
                event_date  = COALESCE($6, event_date),
                price       = COALESCE($7, price),
                capacity    = COALESCE($8, capacity),
                is_active   = COALESCE($9, is_active),
                updated_at  = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(&event.city)
        .bind(event.event_date)
        .bind(event.price)
        .bind(event.capacity)
        .bind(event.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_booking(&self, id: &Uuid) -> Result<Option<BookingEntity>, error::SystemError> {
        let booking = sqlx::query_as::<_, BookingEntity>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn find_booking_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<BookingEntity>, error::SystemError> {
        let booking =
            sqlx::query_as::<_, BookingEntity>("SELECT * FROM bookings WHERE transaction_id = $1")
                .bind(transaction_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(booking)
    }

    async fn find_active_booking(
        &self,
        event_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<BookingEntity>, error::SystemError> {
        let booking = sqlx::query_as::<_, BookingEntity>(
            r#"
            SELECT * FROM bookings
            WHERE event_id = $1 AND user_id = $2 AND booking_status = 'confirmed'
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn find_user_bookings(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<BookingWithEvent>, error::SystemError> {
        let bookings = sqlx::query_as::<_, BookingWithEvent>(
            r#"
            SELECT
                b.*,
                e.title AS event_title,
                e.venue AS event_venue,
                e.city AS event_city,
                e.event_date
            FROM bookings b
            JOIN dinner_events e ON e.id = b.event_id
            WHERE b.user_id = $1
            ORDER BY e.event_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn find_attendees(
        &self,
        event_id: &Uuid,
    ) -> Result<Vec<AttendeeResponse>, error::SystemError> {
        let attendees = sqlx::query_as::<_, AttendeeResponse>(
            r#"
            SELECT
                u.id AS user_id,
                u.name,
                u.gender,
                un.name AS university_name,
                (
                    SELECT i.url
                    FROM user_images i
                    WHERE i.user_id = u.id
                    ORDER BY i.slot
                    LIMIT 1
                ) AS avatar_url,
                b.seats,
                b.created_at AS booked_at
            FROM bookings b
            JOIN users u ON u.id = b.user_id AND u.deleted_at IS NULL
            LEFT JOIN universities un ON un.id = u.university_id
            WHERE b.event_id = $1 AND b.booking_status = 'confirmed'
            ORDER BY b.created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attendees)
    }

    async fn update_payment(
        &self,
        booking_id: &Uuid,
        status: PaymentStatus,
        gateway_payment_id: Option<&str>,
    ) -> Result<Option<BookingEntity>, error::SystemError> {
        let booking = sqlx::query_as::<_, BookingEntity>(
            r#"
            UPDATE bookings
            SET payment_status = $2,
                gateway_payment_id = COALESCE($3, gateway_payment_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(status)
        .bind(gateway_payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn cancel_booking(
        &self,
        booking_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<BookingEntity>, error::SystemError> {
        let booking = sqlx::query_as::<_, BookingEntity>(
            r#"
            UPDATE bookings b
            SET booking_status = 'cancelled',
                payment_status = CASE
                    WHEN b.payment_status = 'completed' THEN 'refunded'::payment_status
                    ELSE b.payment_status
                END,
                updated_at = NOW()
            FROM dinner_events e
            WHERE b.id = $1
            AND b.user_id = $2
            AND b.booking_status = 'confirmed'
            AND e.id = b.event_id
            AND e.event_date > NOW()
            RETURNING b.*
            "#,
        )
        .bind(booking_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }
}

#[async_trait::async_trait]
impl EventRepo for EventRepositoryPg {
    async fn create_booking_atomic(
        &self,
        booking: &NewBooking,
    ) -> Result<BookingOutcome, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, DinnerEventEntity>(
            "SELECT * FROM dinner_events WHERE id = $1 FOR UPDATE",
        )
        .bind(booking.event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(event) = event else {
            return Ok(BookingOutcome::EventNotFound);
        };

        if !event.is_open_for_booking(chrono::Utc::now()) {
            return Ok(BookingOutcome::Closed);
        }

        let already_booked = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bookings
                WHERE event_id = $1 AND user_id = $2 AND booking_status = 'confirmed'
            )
            "#,
        )
        .bind(booking.event_id)
        .bind(booking.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_booked {
            return Ok(BookingOutcome::AlreadyBooked);
        }

        let booked = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(seats), 0)::BIGINT FROM bookings
            WHERE event_id = $1 AND booking_status = 'confirmed'
            "#,
        )
        .bind(booking.event_id)
        .fetch_one(&mut *tx)
        .await?;

        let seats_left = (i64::from(event.capacity) - booked).max(0);
        if i64::from(booking.seats) > seats_left {
            return Ok(BookingOutcome::SoldOut { seats_left });
        }

        let created = sqlx::query_as::<_, BookingEntity>(
            r#"
            INSERT INTO bookings (
                id, event_id, user_id, seats, amount, payment_gateway, payment_status,
                transaction_id, gateway_order_id, gateway_payment_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(booking.event_id)
        .bind(booking.user_id)
        .bind(booking.seats)
        .bind(event.price * i64::from(booking.seats))
        .bind(booking.payment_gateway)
        .bind(booking.payment_status)
        .bind(&booking.transaction_id)
        .bind(&booking.gateway_order_id)
        .bind(&booking.gateway_payment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(BookingOutcome::Created(created))
    }
}

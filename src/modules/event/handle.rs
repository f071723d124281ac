use actix_web::{HttpRequest, get, middleware::from_fn, patch, post, web};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::{authorization, get_claims},
    modules::{
        event::{
            model::{
                AttendeeResponse, BookingWithEvent, CreateBookingModel, CreateEventModel,
                EventDetailResponse, EventQuery, EventResponse, PhonePeCallback, UpdateEventModel,
                VerifyPaymentModel,
            },
            repository_pg::EventRepositoryPg,
            schema::{BookingEntity, DinnerEventEntity},
            service::EventService,
        },
        user::schema::UserRole,
    },
    utils::{ValidatedJson, ValidatedQuery},
};

pub type EventSvc = EventService<EventRepositoryPg>;

#[get("")]
pub async fn list_events(
    event_service: web::Data<EventSvc>,
    query: ValidatedQuery<EventQuery>,
) -> Result<success::Success<Vec<EventResponse>>, error::Error> {
    let events = event_service.list_events(query.0).await?;
    Ok(success::Success::ok(Some(events)).message("Events retrieved successfully"))
}

#[get("/{event_id}")]
pub async fn get_event(
    event_service: web::Data<EventSvc>,
    event_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<EventDetailResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let event = event_service.get_event(user_id, event_id.into_inner()).await?;
    Ok(success::Success::ok(Some(event)))
}

#[post("", wrap = "from_fn(authorization(vec![UserRole::Admin]))")]
pub async fn create_event(
    event_service: web::Data<EventSvc>,
    body: ValidatedJson<CreateEventModel>,
    req: HttpRequest,
) -> Result<success::Success<DinnerEventEntity>, error::Error> {
    let admin_id = get_claims(&req)?.sub;
    let event = event_service.create_event(admin_id, body.0).await?;
    Ok(success::Success::created(Some(event)).message("Event created successfully"))
}

#[patch("/{event_id}", wrap = "from_fn(authorization(vec![UserRole::Admin]))")]
pub async fn update_event(
    event_service: web::Data<EventSvc>,
    event_id: web::Path<Uuid>,
    body: ValidatedJson<UpdateEventModel>,
) -> Result<success::Success<DinnerEventEntity>, error::Error> {
    let event = event_service.update_event(event_id.into_inner(), body.0).await?;
    Ok(success::Success::ok(Some(event)).message("Event updated successfully"))
}

#[get("/{event_id}/attendees")]
pub async fn list_attendees(
    event_service: web::Data<EventSvc>,
    event_id: web::Path<Uuid>,
) -> Result<success::Success<Vec<AttendeeResponse>>, error::Error> {
    let attendees = event_service.get_attendees(event_id.into_inner()).await?;
    Ok(success::Success::ok(Some(attendees)))
}

#[post("/{event_id}/bookings")]
pub async fn create_booking(
    event_service: web::Data<EventSvc>,
    event_id: web::Path<Uuid>,
    body: ValidatedJson<CreateBookingModel>,
    req: HttpRequest,
) -> Result<success::Success<BookingEntity>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let booking = event_service.create_booking(user_id, event_id.into_inner(), body.0).await?;
    Ok(success::Success::created(Some(booking)).message("Booking created successfully"))
}

#[get("")]
pub async fn list_bookings(
    event_service: web::Data<EventSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<BookingWithEvent>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let bookings = event_service.list_bookings(user_id).await?;
    Ok(success::Success::ok(Some(bookings)).message("Bookings retrieved successfully"))
}

#[post("/{booking_id}/verify")]
pub async fn verify_payment(
    event_service: web::Data<EventSvc>,
    booking_id: web::Path<Uuid>,
    body: ValidatedJson<VerifyPaymentModel>,
    req: HttpRequest,
) -> Result<success::Success<BookingEntity>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let booking = event_service.verify_payment(user_id, booking_id.into_inner(), body.0).await?;
    Ok(success::Success::ok(Some(booking)).message("Payment verified successfully"))
}

#[post("/{booking_id}/cancel")]
pub async fn cancel_booking(
    event_service: web::Data<EventSvc>,
    booking_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<BookingEntity>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let booking = event_service.cancel_booking(user_id, booking_id.into_inner()).await?;
    Ok(success::Success::ok(Some(booking)).message("Booking cancelled successfully"))
}

#[post("/phonepe/callback")]
pub async fn phonepe_callback(
    event_service: web::Data<EventSvc>,
    body: web::Json<PhonePeCallback>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let x_verify = req
        .headers()
        .get("X-VERIFY")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| error::Error::unauthorized("Missing X-VERIFY header"))?;

    event_service.phonepe_callback(x_verify, body.into_inner()).await?;
    Ok(success::Success::no_content())
}

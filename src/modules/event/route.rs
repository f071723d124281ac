use crate::modules::event::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/payments").service(phonepe_callback));
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/events")
            .service(list_events)
            .service(create_event)
            .service(list_attendees)
            .service(create_booking)
            .service(get_event)
            .service(update_event),
    )
    .service(
        scope("/bookings")
            .service(list_bookings)
            .service(verify_payment)
            .service(cancel_booking),
    );
}

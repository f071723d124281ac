use crate::modules::connection::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/connections")
            .service(list_connections)
            .service(list_requests)
            .service(connection_state)
            .service(connection_action),
    );
}

use crate::modules::message::handle::*;
use actix_web::web::{ServiceConfig, scope};

/// Must be registered before the `/conversations` scope, which would otherwise
/// swallow `/conversations/{id}/messages`.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/conversations/{conversation_id}/messages")
            .service(get_messages)
            .service(send_message),
    )
    .service(scope("/messages").service(delete_message));
}

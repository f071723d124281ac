use crate::modules::conversation::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/conversations")
            .service(get_conversations)
            .service(create_conversation)
            .service(mark_as_read)
            .service(leave_conversation),
    );
}

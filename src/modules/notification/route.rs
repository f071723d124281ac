use crate::modules::notification::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/notifications").service(get_notifications));
}

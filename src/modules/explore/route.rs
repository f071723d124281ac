use crate::modules::explore::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/explore").service(explore).service(explore_profile));
}

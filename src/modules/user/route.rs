use crate::modules::user::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/users").service(get_me).service(update_me).service(delete_me).service(get_user),
    );
}

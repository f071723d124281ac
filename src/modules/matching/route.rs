use crate::modules::matching::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/adjectives").service(select_adjective).service(get_adjectives))
        .service(scope("/matches").service(list_matches).service(connect_match));
}

use crate::modules::university::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/universities").service(list_universities));
}

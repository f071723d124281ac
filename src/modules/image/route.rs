use crate::modules::image::handle::*;
use actix_web::web::{ServiceConfig, scope};

/// Must be registered before the `/users` scope so `/users/me/images` is not captured by it.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/users/me/images").service(list_images).service(upload_image).service(delete_image),
    );
}

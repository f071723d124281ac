use crate::{
    configs::RedisCache,
    constants::{AUTH_RATE_LIMIT, AUTH_RATE_WINDOW},
    middlewares::rate_limit,
    modules::auth::handle::*,
};
use actix_web::{
    middleware::from_fn,
    web::{ServiceConfig, scope},
};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/auth")
            .wrap(from_fn(rate_limit::<RedisCache, _>("auth", AUTH_RATE_LIMIT, AUTH_RATE_WINDOW)))
            .service(request_otp)
            .service(verify_otp)
            .service(sign_up)
            .service(refresh)
            .service(logout),
    );
}

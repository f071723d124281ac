use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};
use futures_util::{future::LocalBoxFuture, FutureExt};
use std::rc::Rc;

use crate::{
    api::error,
    configs::CacheStore,
    constants::ACCESS_TOKEN_COOKIE,
    modules::user::schema::UserRole,
    utils::{Claims, TypeClaims},
};

fn access_claims(req: &ServiceRequest, secret: &str) -> Result<Claims, error::Error> {
    let header_token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    let cookie_token = || req.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string());

    let token = header_token
        .or_else(cookie_token)
        .ok_or_else(|| error::Error::unauthorized("Token Invalid or Expired"))?;

    let claims = Claims::decode(&token, secret.as_bytes())
        .map_err(|_| error::Error::unauthorized("Token Invalid or Expired"))?;

    if claims._type != Some(TypeClaims::AccessToken) {
        return Err(error::Error::unauthorized("Access token required"));
    }

    Ok(claims)
}

/// Verifies the bearer header or access cookie and stores the claims on the request.
pub fn authentication<B>(
    jwt_secret: String,
) -> impl Fn(
    ServiceRequest,
    Next<B>,
) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>
where
    B: MessageBody + 'static,
{
    let jwt_secret = Rc::new(jwt_secret);
    move |req: ServiceRequest, next: Next<B>| {
        let secret = jwt_secret.clone();
        async move {
            let claims = access_claims(&req, &secret)?;
            req.extensions_mut().insert(claims);
            next.call(req).await
        }
        .boxed_local()
    }
}

pub fn get_claims(req: &HttpRequest) -> Result<Claims, error::Error> {
    let extensions = req.extensions();

    let claims = extensions
        .get::<Claims>()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))?
        .clone();

    Ok(claims)
}

pub fn authorization<B>(
    allowed_roles: Vec<UserRole>,
) -> impl Fn(
    ServiceRequest,
    Next<B>,
) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, actix_web::Error>>
where
    B: MessageBody + 'static,
{
    let allowed_roles = Rc::new(allowed_roles);
    move |req: ServiceRequest, next: Next<B>| {
        let roles = allowed_roles.clone();
        async move {
            let role = get_claims(req.request())?.role;

            if !roles.contains(&role) {
                return Err(error::Error::forbidden("No permission").into());
            }
            next.call(req).await
        }
        .boxed_local()
    }
}

/// Fixed-window limiter keyed by the peer address; answers 429 once `max` is exceeded.
/// Forwarding headers are ignored since clients can set them freely.
pub fn rate_limit<K, B>(
    scope: &'static str,
    max: u64,
    window: u64,
) -> impl Fn(
    ServiceRequest,
    Next<B>,
) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, actix_web::Error>>
where
    K: CacheStore + 'static,
    B: MessageBody + 'static,
{
    move |req: ServiceRequest, next: Next<B>| {
        async move {
            let ip = req
                .peer_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            if let Some(cache) = req.app_data::<web::Data<K>>().cloned() {
                let key = format!("rate_limit:{scope}:{ip}");
                match cache.incr_with_ttl(&key, window).await {
                    Ok(count) if count > max => {
                        log::warn!("Rate limit exceeded for {ip} on {scope}");
                        return Err(error::Error::too_many_requests(
                            "Too many requests, please try again later",
                        )
                        .into());
                    }
                    Ok(_) => {}
                    // fail open
                    Err(e) => log::error!("Rate limiter unavailable: {e}"),
                }
            }

            next.call(req).await
        }
        .boxed_local()
    }
}

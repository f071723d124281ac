use actix_web::{
    HttpRequest,
    cookie::{Cookie, SameSite, time},
    post, web,
};

use crate::{
    ENV,
    api::{error, success},
    configs::RedisCache,
    constants::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    modules::{
        auth::{
            model::{
                AuthResponse, OtpRequestResponse, RefreshResponse, RequestOtpModel, SignUpModel,
                TokenPair, VerifyOtpModel, VerifyOtpResponse, VerifyOutcome,
            },
            otp::LogOtpSender,
            service::AuthService,
        },
        image::repository_pg::ImageRepositoryPg,
        university::repository_pg::UniversityRepositoryPg,
        user::repository_pg::UserRepositoryPg,
    },
    utils::ValidatedJson,
};

pub type AuthSvc = AuthService<
    UserRepositoryPg,
    UniversityRepositoryPg,
    ImageRepositoryPg,
    RedisCache,
    LogOtpSender,
>;

fn build_cookie(name: &'static str, value: String, max_age: i64) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(ENV.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .finish()
}

fn clear_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(0))
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .finish()
}

fn token_cookies(service: &AuthSvc, tokens: &TokenPair) -> Vec<Cookie<'static>> {
    let config = service.config();
    vec![
        build_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
            config.access_token_expiration as i64,
        ),
        build_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
            config.refresh_token_expiration as i64,
        ),
    ]
}

#[post("/otp/request")]
pub async fn request_otp(
    auth_service: web::Data<AuthSvc>,
    body: ValidatedJson<RequestOtpModel>,
) -> Result<success::Success<OtpRequestResponse>, error::Error> {
    let is_new_user = auth_service.request_otp(&body.0.email).await?;
    Ok(success::Success::ok(Some(OtpRequestResponse { is_new_user })).message("OTP sent"))
}

#[post("/otp/verify")]
pub async fn verify_otp(
    auth_service: web::Data<AuthSvc>,
    body: ValidatedJson<VerifyOtpModel>,
) -> Result<success::Success<VerifyOtpResponse>, error::Error> {
    match auth_service.verify_otp(body.0).await? {
        VerifyOutcome::Existing { user, tokens } => {
            let cookies = token_cookies(&auth_service, &tokens);
            let response = VerifyOtpResponse {
                is_new_user: false,
                user: Some(user),
                access_token: Some(tokens.access_token),
            };
            Ok(success::Success::ok(Some(response)).message("Signin successful").cookies(cookies))
        }
        VerifyOutcome::NewUser => {
            let response = VerifyOtpResponse { is_new_user: true, user: None, access_token: None };
            Ok(success::Success::ok(Some(response)).message("Email verified, complete signup"))
        }
    }
}

#[post("/signup")]
pub async fn sign_up(
    auth_service: web::Data<AuthSvc>,
    body: ValidatedJson<SignUpModel>,
) -> Result<success::Success<AuthResponse>, error::Error> {
    let (user, tokens) = auth_service.sign_up(body.0).await?;
    let cookies = token_cookies(&auth_service, &tokens);
    let response = AuthResponse { user, access_token: tokens.access_token };
    Ok(success::Success::created(Some(response)).message("Signup successful").cookies(cookies))
}

#[post("/refresh")]
pub async fn refresh(
    auth_service: web::Data<AuthSvc>,
    req: HttpRequest,
) -> Result<success::Success<RefreshResponse>, error::Error> {
    let refresh_token = req.cookie(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());
    let tokens = auth_service.refresh(refresh_token).await?;
    let cookies = token_cookies(&auth_service, &tokens);
    let response = RefreshResponse { access_token: tokens.access_token };
    Ok(success::Success::ok(Some(response)).message("Refresh successful").cookies(cookies))
}

#[post("/logout")]
pub async fn logout(
    auth_service: web::Data<AuthSvc>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let refresh_token = req.cookie(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());
    auth_service.logout(refresh_token).await?;
    Ok(success::Success::no_content()
        .cookies(vec![clear_cookie(ACCESS_TOKEN_COOKIE), clear_cookie(REFRESH_TOKEN_COOKIE)]))
}

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use deadpool_redis::{redis::RedisError, CreatePoolError, PoolError};
use std::borrow::Cow;

use crate::ENV;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Forbidden: {0}")]
    Forbidden(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Too Many Requests: {0}")]
    TooManyRequests(Cow<'static, str>),
    #[error("Internal Server Error")]
    InternalServer,
}

#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn too_many_requests(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::TooManyRequests(msg.into())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let header = ("Access-Control-Allow-Origin", ENV.frontend_url.as_str());
        let mut res = HttpResponse::build(self.status_code());

        res.insert_header(header);
        res.insert_header(("Access-Control-Allow-Credentials", "true"));

        let message = match self {
            Error::NotFound(msg)
            | Error::Conflict(msg)
            | Error::Unauthorized(msg)
            | Error::BadRequest(msg)
            | Error::Forbidden(msg)
            | Error::TooManyRequests(msg) => msg.clone(),
            Error::InternalServer => "Internal Server Error".into(),
        };

        res.json(ErrorBody { success: false, message })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    // jwt errors
    #[error("JWT Error")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    // argon2 errors
    #[error("Hash Error")]
    HashError(#[from] argon2::password_hash::Error),
    // sqlx errors
    #[error("Database Error : {0}")]
    DatabaseError(Cow<'static, str>),
    #[error("Migration Error")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    // serde errors
    #[error("JSON Serialization/Deserialization Error")]
    JsonError(#[from] serde_json::Error),
    // storage errors
    #[error("IO Error")]
    IoError(#[from] std::io::Error),
    // redis errors
    #[error(transparent)]
    PoolInit(#[from] CreatePoolError),
    #[error("Redis pool error: {0}")]
    PoolGet(#[from] PoolError),
    #[error("Redis error")]
    RedisError(#[from] RedisError),
    // Custom Errors
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Forbidden: {0}")]
    Forbidden(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Too Many Requests: {0}")]
    TooManyRequests(Cow<'static, str>),
    #[error("Database Conflict: {0:?}")]
    UniqueViolation(Option<DbErrorMeta>),
    #[error("Internal System Error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

fn conflict_message(meta: &Option<DbErrorMeta>) -> Cow<'static, str> {
    let Some(m) = meta else {
        return "Duplicate value".into();
    };

    let Some(constraint) = &m.constraint else {
        return "Duplicate value".into();
    };

    // constraints are named <table>_<column>_key
    let field = constraint.trim_end_matches("_key").split('_').next_back().unwrap_or("value");

    let mut chars = field.chars();
    let field = match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => "Value".to_string(),
    };

    format!("{field} already exists").into()
}

#[derive(Debug)]
pub struct DbErrorMeta {
    pub constraint: Option<String>,
}

impl From<SystemError> for Error {
    fn from(value: SystemError) -> Self {
        match value {
            SystemError::BadRequest(msg) => Error::BadRequest(msg),
            SystemError::Unauthorized(msg) => Error::Unauthorized(msg),
            SystemError::Forbidden(msg) => Error::Forbidden(msg),
            SystemError::NotFound(msg) => Error::NotFound(msg),
            SystemError::Conflict(msg) => Error::Conflict(msg),
            SystemError::TooManyRequests(msg) => Error::TooManyRequests(msg),
            SystemError::UniqueViolation(meta) => Error::Conflict(conflict_message(&meta)),
            SystemError::JwtError(_) => Error::Unauthorized("Token Invalid or Expired".into()),
            _ => {
                log::error!("Internal Server Error: {:?}", value);
                Error::InternalServer
            }
        }
    }
}

impl From<sqlx::Error> for SystemError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    return SystemError::UniqueViolation(Some(DbErrorMeta {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                    }));
                }
                Some("23503") => {
                    return SystemError::NotFound("Referenced resource not found".into());
                }
                _ => {
                    log::error!("Unhandled DB error: {:?}", db_err);
                    return SystemError::DatabaseError(db_err.message().to_string().into());
                }
            }
        }
        log::error!("{:?}", err);
        SystemError::InternalError(Box::new(err))
    }
}

impl SystemError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn too_many_requests(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::TooManyRequests(msg.into())
    }
}

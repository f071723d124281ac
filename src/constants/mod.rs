pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Window used by the per-email OTP limiter, in seconds.
pub const OTP_RATE_WINDOW: u64 = 600;
pub const OTP_MAX_ATTEMPTS: u32 = 5;
pub const VERIFIED_EMAIL_TTL: u64 = 900;

pub const AUTH_RATE_LIMIT: u64 = 30;
pub const AUTH_RATE_WINDOW: u64 = 60;

pub const USER_CACHE_TTL: usize = 3600;

pub struct Env {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
    pub refresh_token_expiration: u64,
    pub database_url: String,
    pub redis_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub workers: usize,
    pub cookie_secure: bool,
    pub otp_ttl: u64,
    pub otp_max_requests: u64,
    pub upload_dir: String,
    pub media_base_url: String,
    pub max_image_size: usize,
    pub razorpay_key_secret: String,
    pub phonepe_salt_key: String,
    pub phonepe_salt_index: String,
    pub university_cache_ttl: usize,
    pub explore_candidate_limit: i64,
}

fn var_or<T>(name: &str, default: &str) -> T
where
    T: std::str::FromStr,
{
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>()))
}

impl Env {
    fn new() -> Self {
        let jwt_secret = std::env::var("SECRET_KEY")
            .expect("SECRET_KEY must be set in .env file or environment variable");

        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");
        let redis_url = std::env::var("REDIS_URL")
            .expect("REDIS_URL must be set in .env file or environment variable");

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let ip = std::env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());

        Env {
            jwt_secret,
            access_token_expiration: var_or("ACCESS_TOKEN_EXPIRATION", "900"),
            refresh_token_expiration: var_or("REFRESH_TOKEN_EXPIRATION", "604800"),
            database_url,
            redis_url,
            frontend_url,
            ip,
            port: var_or("PORT", "8080"),
            workers: var_or("WORKERS", "2"),
            cookie_secure: var_or("COOKIE_SECURE", "false"),
            otp_ttl: var_or("OTP_TTL", "300"),
            otp_max_requests: var_or("OTP_MAX_REQUESTS", "5"),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            media_base_url: std::env::var("MEDIA_BASE_URL")
                .unwrap_or_else(|_| "/media".to_string()),
            max_image_size: var_or("MAX_IMAGE_SIZE", "5242880"),
            razorpay_key_secret: std::env::var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
            phonepe_salt_key: std::env::var("PHONEPE_SALT_KEY").unwrap_or_default(),
            phonepe_salt_index: std::env::var("PHONEPE_SALT_INDEX")
                .unwrap_or_else(|_| "1".to_string()),
            university_cache_ttl: var_or("UNIVERSITY_CACHE_TTL", "86400"),
            explore_candidate_limit: var_or("EXPLORE_CANDIDATE_LIMIT", "500"),
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

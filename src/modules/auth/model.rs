use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::user::{model::ProfileResponse, schema::Gender};

#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpModel {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpModel {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpModel {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 80, message = "Name must be between 1 and 80 characters"))]
    pub name: String,
    pub gender: Gender,
    pub university_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120, message = "Degree must be between 1 and 120 characters"))]
    pub degree: Option<String>,
    #[validate(range(min = 1, max = 8, message = "Year must be between 1 and 8"))]
    pub year: Option<i16>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OtpRequestResponse {
    pub is_new_user: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub is_new_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ProfileResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: ProfileResponse,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Pending OTP as stored in Redis under `otp:{email}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRecord {
    pub hash: String,
    pub attempts: u32,
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub enum VerifyOutcome {
    Existing { user: ProfileResponse, tokens: TokenPair },
    NewUser,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

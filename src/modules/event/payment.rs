use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    api::error,
    modules::event::schema::{PaymentGateway, PaymentStatus},
};

type HmacSha256 = Hmac<Sha256>;

pub const PHONEPE_SUCCESS_CODE: &str = "PAYMENT_SUCCESS";

#[derive(Debug, Clone, Default)]
pub struct PaymentConfig {
    pub razorpay_key_secret: String,
    pub phonepe_salt_key: String,
    pub phonepe_salt_index: String,
}

/// Cash is settled at the venue and always starts pending. Online gateways are
/// trusted as completed unless the caller states otherwise.
pub fn resolve_payment_status(
    gateway: PaymentGateway,
    requested: Option<PaymentStatus>,
) -> PaymentStatus {
    match gateway {
        PaymentGateway::Cash => PaymentStatus::Pending,
        _ => requested.unwrap_or(PaymentStatus::Completed),
    }
}

/// `TXN{unix millis}{first 8 hex chars of the user id}`.
pub fn transaction_id(user_id: &Uuid, now: chrono::DateTime<chrono::Utc>) -> String {
    let simple = user_id.simple().to_string();
    format!("TXN{}{}", now.timestamp_millis(), &simple[..8]).to_uppercase()
}

/// Razorpay signs `order_id|payment_id` with the key secret (HMAC-SHA256, hex).
pub fn verify_razorpay_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key_secret.as_bytes()) else {
        return false;
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// `sha256(base64_body + salt_key)` in hex, followed by `###` and the salt index.
pub fn phonepe_checksum(base64_body: &str, salt_key: &str, salt_index: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base64_body.as_bytes());
    hasher.update(salt_key.as_bytes());
    format!("{}###{salt_index}", hex::encode(hasher.finalize()))
}

pub fn verify_phonepe_checksum(
    base64_body: &str,
    header: &str,
    salt_key: &str,
    salt_index: &str,
) -> bool {
    phonepe_checksum(base64_body, salt_key, salt_index).eq_ignore_ascii_case(header.trim())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonePePayload {
    pub code: String,
    pub data: PhonePePayloadData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonePePayloadData {
    pub merchant_transaction_id: String,
    pub transaction_id: Option<String>,
}

impl PhonePePayload {
    pub fn decode(base64_body: &str) -> Result<Self, error::SystemError> {
        let raw = STANDARD
            .decode(base64_body.trim())
            .map_err(|_| error::SystemError::bad_request("Callback body is not valid base64"))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn status(&self) -> PaymentStatus {
        if self.code == PHONEPE_SUCCESS_CODE { PaymentStatus::Completed } else { PaymentStatus::Failed }
    }
}

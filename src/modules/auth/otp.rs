use crate::api::error;

/// Delivery channel for one-time codes.
#[async_trait::async_trait]
pub trait OtpSender {
    async fn send(&self, email: &str, code: &str) -> Result<(), error::SystemError>;
}

/// Writes codes to the log; used until a mail transport is configured.
#[derive(Clone, Default)]
pub struct LogOtpSender;

#[async_trait::async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, email: &str, code: &str) -> Result<(), error::SystemError> {
        log::info!("OTP for {email}: {code}");
        Ok(())
    }
}

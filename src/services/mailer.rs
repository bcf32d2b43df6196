use async_trait::async_trait;

use crate::errors::AppResult;

/// Delivers password-reset links. Mail transport lives outside this
/// service; deployments plug an implementation in at startup.
#[async_trait]
pub trait PasswordResetMailer: Send + Sync {
    async fn send_reset_link(&self, email: &str, reset_url: &str) -> AppResult<()>;
}

/// Writes the link to the application log.
pub struct LogMailer;

#[async_trait]
impl PasswordResetMailer for LogMailer {
    async fn send_reset_link(&self, email: &str, reset_url: &str) -> AppResult<()> {
        log::info!("Password reset requested for {}: {}", email, reset_url);
        Ok(())
    }
}

use super::{DeliveryError, MagicLinkEmail, MagicLinkSender};
use async_trait::async_trait;

/// Development sender that writes the link to the log instead of emailing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl MagicLinkSender for LogMailer {
    async fn send(&self, email: &MagicLinkEmail) -> Result<(), DeliveryError> {
        tracing::info!(to = %email.to, link = %email.link, "Magic link (not emailed)");
        Ok(())
    }
}

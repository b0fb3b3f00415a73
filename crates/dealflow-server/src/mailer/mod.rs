//! Magic-link email delivery
//!
//! [`MagicLinkSender`] is the outbound seam. [`HttpMailer`] posts to a
//! transactional email API; [`LogMailer`] only logs, for local runs without
//! mail credentials.

mod http;
mod log;

pub use http::HttpMailer;
pub use log::LogMailer;

use crate::config::MailConfig;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

pub const MAGIC_LINK_SUBJECT: &str = "Your sign-in link";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("mail transport is not configured")]
    NotConfigured,

    #[error("mail transport request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail transport rejected the message (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

/// A rendered sign-in email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    /// The link embedded in the body
    pub link: String,
}

impl MagicLinkEmail {
    pub fn compose(to: &str, link: &Url, api_name: &str, ttl_minutes: i64) -> Self {
        let text_body = format!(
            "Hello,\n\n\
             Use this link to sign in to {api_name}:\n\
             {link}\n\n\
             This link expires in {ttl_minutes} minutes and can only be used once.\n"
        );

        Self {
            to: to.to_string(),
            subject: MAGIC_LINK_SUBJECT.to_string(),
            text_body,
            link: link.to_string(),
        }
    }
}

#[async_trait]
pub trait MagicLinkSender: Send + Sync {
    async fn send(&self, email: &MagicLinkEmail) -> Result<(), DeliveryError>;
}

/// Pick the HTTP transport when mail is configured, otherwise log links.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn MagicLinkSender>, DeliveryError> {
    if config.is_configured() {
        Ok(Arc::new(HttpMailer::new(config)?))
    } else {
        tracing::warn!("Mail transport not configured; magic links will only be logged");
        Ok(Arc::new(LogMailer))
    }
}

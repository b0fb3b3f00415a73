use super::{DeliveryError, MagicLinkEmail, MagicLinkSender};
use crate::config::MailConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    text_content: String,
}

/// Sends through a transactional email HTTP API (`api-key` header, JSON body).
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, DeliveryError> {
        let (Some(api_url), Some(api_key), Some(sender_email)) = (
            config.api_url.clone(),
            config.api_key.clone(),
            config.sender_email.clone(),
        ) else {
            return Err(DeliveryError::NotConfigured);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Dealflow-Server/1.0")
            .build()?;

        Ok(Self {
            client,
            api_url,
            api_key,
            sender_email,
            sender_name: config.sender_name.clone(),
        })
    }
}

#[async_trait]
impl MagicLinkSender for HttpMailer {
    async fn send(&self, email: &MagicLinkEmail) -> Result<(), DeliveryError> {
        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: vec![EmailAddress {
                email: email.to.clone(),
                name: None,
            }],
            subject: email.subject.clone(),
            text_content: email.text_body.clone(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to = %email.to, "Magic link email accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

//! Transactional email delivery through a Resend-compatible HTTP API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email delivery is not configured")]
    NotConfigured,
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email API rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("email API reply carried no message id")]
    MissingId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message and return the provider's message id.
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError>;
}

#[derive(Debug, Deserialize)]
struct SendReply {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ResendMailer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError> {
        let api_key = self.api_key.as_deref().ok_or(EmailError::NotConfigured)?;
        let url = format!("{}/emails", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reply: SendReply = response.json().await?;
        let id = reply
            .id
            .filter(|id| !id.is_empty())
            .ok_or(EmailError::MissingId)?;
        debug!("email {:?} to {:?} accepted as {}", message.subject, message.to, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_is_reported() {
        let mailer = ResendMailer::new(reqwest::Client::new(), "https://api.resend.com", None);
        let message = EmailMessage {
            from: "info@example.com".into(),
            to: vec!["a@example.com".into()],
            subject: "s".into(),
            html: "<p>h</p>".into(),
        };
        assert!(matches!(
            mailer.send(&message).await,
            Err(EmailError::NotConfigured)
        ));
    }

    #[test]
    fn message_serializes_to_the_api_shape() {
        let message = EmailMessage {
            from: "info@example.com".into(),
            to: vec!["a@example.com".into()],
            subject: "Hi".into(),
            html: "<p>x</p>".into(),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({
                "from": "info@example.com",
                "to": ["a@example.com"],
                "subject": "Hi",
                "html": "<p>x</p>"
            })
        );
    }
}

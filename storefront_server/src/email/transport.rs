use async_trait::async_trait;
use log::*;
use resend_rs::{types::CreateEmailBaseOptions, Resend};

use crate::email::EmailError;

/// A fully addressed email, ready to go out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers email. Returns the provider's message id.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<String, EmailError>;
}

/// Sends email through the Resend HTTP API.
pub struct ResendTransport {
    client: Resend,
}

impl ResendTransport {
    pub fn new(api_key: &str) -> Self {
        Self { client: Resend::new(api_key) }
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        let options = CreateEmailBaseOptions::new(email.from.as_str(), [email.to.as_str()], email.subject.as_str())
            .with_html(&email.html);
        let response = self.client.emails.send(options).await.map_err(|e| EmailError::Transport(e.to_string()))?;
        Ok(response.id.to_string())
    }
}

/// Writes email to the log instead of sending it. Used when no email provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        info!("📧️ [not sent] To: {} Subject: {}", email.to, email.subject);
        trace!("📧️ [not sent] {}", email.html);
        Ok(String::from("logged"))
    }
}

use std::sync::Arc;

use log::*;

use crate::{
    config::{EmailConfig, Environment},
    email::{EmailError, EmailMessage, EmailTransport, LogTransport, OutgoingEmail, ResendTransport},
};

/// Renders, addresses and sends transactional email.
#[derive(Clone)]
pub struct EmailService {
    transport: Arc<dyn EmailTransport>,
    from: String,
    environment: Environment,
    dev_email: Option<String>,
    shop_url: String,
}

impl EmailService {
    pub fn new(
        transport: Arc<dyn EmailTransport>,
        config: &EmailConfig,
        environment: Environment,
        shop_url: &str,
    ) -> Self {
        Self {
            transport,
            from: config.from.clone(),
            environment,
            dev_email: config.dev_email.clone(),
            shop_url: shop_url.to_string(),
        }
    }

    /// Sends through Resend when an API key is configured, and to the log otherwise.
    pub fn from_config(config: &EmailConfig, environment: Environment, shop_url: &str) -> Self {
        let transport: Arc<dyn EmailTransport> = if config.resend_api_key.is_unset() {
            Arc::new(LogTransport)
        } else {
            Arc::new(ResendTransport::new(config.resend_api_key.reveal()))
        };
        Self::new(transport, config, environment, shop_url)
    }

    /// Works out who actually receives a message for `recipient`.
    ///
    /// In production that is the recipient. Elsewhere it is the developer address, with the intended recipient
    /// noted in the subject. Returns `None` when there is nobody to send to.
    pub fn address(&self, recipient: &str, subject: &str) -> Option<(String, String)> {
        if self.environment.is_production() {
            return Some((recipient.to_string(), subject.to_string()));
        }
        self.dev_email.as_ref().map(|dev| (dev.clone(), format!("[DEV für {recipient}] {subject}")))
    }

    /// Sends `message`. Returns the provider's message id, or `None` if the message was not sent because there is no
    /// developer address outside production.
    pub async fn send(&self, message: &EmailMessage) -> Result<Option<String>, EmailError> {
        let recipient = message.recipient();
        if !recipient.contains('@') {
            return Err(EmailError::InvalidRecipient(recipient.to_string()));
        }
        let rendered = message.render(&self.shop_url);
        let Some((to, subject)) = self.address(recipient, &rendered.subject) else {
            info!("📧️ No developer address is configured. The {} for {recipient} is not sent.", message.template());
            return Ok(None);
        };
        let email = OutgoingEmail { from: self.from.clone(), to, subject, html: rendered.html };
        let id = self.transport.deliver(&email).await?;
        debug!("📧️ Sent {} to {} ({id})", message.template(), email.to);
        Ok(Some(id))
    }
}

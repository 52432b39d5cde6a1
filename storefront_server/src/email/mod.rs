//! Transactional email.
//!
//! [`EmailMessage`] is the typed payload for each template. It renders into a [`RenderedEmail`] which the
//! [`EmailService`] addresses and hands to an [`EmailTransport`]. Outside production, the service redirects every
//! message to the developer address so that customers never receive test mail.
mod service;
mod templates;
mod transport;

pub use service::EmailService;
pub use templates::{escape_html, EmailMessage, EmailTemplate, RenderedEmail};
use thiserror::Error;
pub use transport::{EmailTransport, LogTransport, OutgoingEmail, ResendTransport};

#[derive(Debug, Clone, Error)]
pub enum EmailError {
    #[error("The email provider rejected the message: {0}")]
    Transport(String),
    #[error("{0} is not a valid recipient")]
    InvalidRecipient(String),
}

#[cfg(test)]
pub(crate) use service::test::RecordingTransport;
#[cfg(test)]
pub(crate) use templates::test as fixtures;

//! Outbound email seam used for registration confirmations.

use async_trait::async_trait;
use thiserror::Error;

mod resend;
mod template;

pub use resend::{ResendConfig, ResendMailer, DEFAULT_RESEND_API_URL};
pub use template::{confirmation_email, escape_html, CONFIRMATION_SUBJECT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Sender identity, e.g. `Mocha Event <onboarding@resend.dev>`.
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Provider-assigned identifier of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryId(pub String);

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("email delivery is not configured")]
    NotConfigured,
    #[error("invalid email provider endpoint {0}")]
    InvalidEndpoint(String),
    #[error("invalid recipient address '{0}'")]
    InvalidRecipient(String),
    #[error("email provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryId, MailerError>;
}

/// Stand-in used when no provider credential is configured.
pub struct MissingMailer;

#[async_trait]
impl Mailer for MissingMailer {
    async fn send(&self, _email: &OutboundEmail) -> Result<DeliveryId, MailerError> {
        Err(MailerError::NotConfigured)
    }
}

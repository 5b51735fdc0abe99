use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::{DeliveryId, Mailer, MailerError, OutboundEmail};

pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_RESEND_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Sends mail through the Resend HTTP API.
pub struct ResendMailer {
    http: Client,
    endpoint: Url,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

impl ResendMailer {
    pub fn new(config: ResendConfig) -> Result<Self, MailerError> {
        let mut base = Url::parse(&config.api_url)
            .map_err(|e| MailerError::InvalidEndpoint(format!("{}: {e}", config.api_url)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("emails")
            .map_err(|e| MailerError::InvalidEndpoint(format!("{}: {e}", config.api_url)))?;
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryId, MailerError> {
        if !is_plausible_recipient(&email.to) {
            warn!("refusing to send to a malformed recipient address");
            return Err(MailerError::InvalidRecipient(email.to.clone()));
        }

        let res = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from: &email.from,
                to: [&email.to],
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let raw = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&raw)
                .map(|body| body.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown provider error")
                        .to_string()
                });
            warn!(status = status.as_u16(), %message, "email provider rejected the message");
            return Err(MailerError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: SendEmailResponse = res.json().await?;
        Ok(DeliveryId(body.id))
    }
}

fn is_plausible_recipient(address: &str) -> bool {
    let mut parts = address.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !address.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/resend_tests.rs"]
mod tests;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use shared::protocol::{EmailStatus, RegistrationRequest, REGISTER_ROUTE};
use url::Url;

use crate::error::{SubmissionError, REGISTER_FAILED, SERVER_ERROR_OCCURRED};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What the client learns from a successful registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub email: EmailStatus,
}

#[async_trait]
pub trait RegistrationTransport: Send + Sync {
    async fn submit(
        &self,
        request: &RegistrationRequest,
    ) -> std::result::Result<SubmissionReceipt, SubmissionError>;
}

/// Body fields the client looks at; every one of them may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    email_sent: Option<bool>,
    #[serde(default)]
    email_error: Option<String>,
}

impl ResponseBody {
    /// Any JSON value is accepted; fields are read only from objects.
    fn from_json(value: serde_json::Value) -> Self {
        if value.is_object() {
            serde_json::from_value(value).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}

pub struct HttpRegistrationClient {
    http: Client,
    endpoint: Url,
}

impl HttpRegistrationClient {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(server_url)
            .and_then(|base| base.join(REGISTER_ROUTE))
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RegistrationTransport for HttpRegistrationClient {
    async fn submit(
        &self,
        request: &RegistrationRequest,
    ) -> std::result::Result<SubmissionReceipt, SubmissionError> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = res.status();
        let is_json = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        let opaque = || SubmissionError::Server {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or(SERVER_ERROR_OCCURRED)
                .to_string(),
        };

        if !is_json {
            return Err(opaque());
        }
        let raw = res.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&raw).map_err(|_| opaque())?;
        let body = ResponseBody::from_json(value);

        if !status.is_success() {
            return Err(SubmissionError::Server {
                status: status.as_u16(),
                message: body
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| REGISTER_FAILED.to_string()),
            });
        }

        Ok(SubmissionReceipt {
            email: EmailStatus::from_wire(body.email_sent, body.email_error),
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

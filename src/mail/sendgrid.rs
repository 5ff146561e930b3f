//! SendGrid v3 mail dispatcher.
//!
//! Messages are posted as JSON to `{base_url}/v3/mail/send` with a bearer API
//! key. SendGrid answers `202 Accepted` on success.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{Email, MailDispatcher};
use crate::error::MailError;

/// Default SendGrid API base URL.
pub const DEFAULT_SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";

/// Path of the send endpoint relative to the base URL.
const MAIL_SEND_PATH: &str = "/v3/mail/send";

const ATTACHMENT_DISPOSITION: &str = "attachment";

/// Mail dispatcher backed by the SendGrid HTTP API.
#[derive(Clone)]
pub struct SendGridClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl SendGridClient {
    /// Create a client against the public SendGrid API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_SENDGRID_BASE_URL)
    }

    /// Create a client against a custom base URL (proxies, EU data residency).
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), MAIL_SEND_PATH),
        }
    }

    /// Full URL messages are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MailDispatcher for SendGridClient {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let payload = SendGridMessage::from(email);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Mail accepted by SendGrid");
        Ok(())
    }
}

// =============================================================================
// Wire Format
// =============================================================================

#[derive(Debug, Serialize)]
struct SendGridMessage<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<SendGridAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct SendGridAttachment<'a> {
    content: &'a str,
    filename: &'a str,
    #[serde(rename = "type")]
    mime_type: &'a str,
    disposition: &'static str,
}

impl<'a> From<&'a Email> for SendGridMessage<'a> {
    fn from(email: &'a Email) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![Address { email: &email.to }],
            }],
            from: Address { email: &email.from },
            subject: &email.subject,
            content: vec![Content {
                content_type: "text/html",
                value: &email.html,
            }],
            attachments: email
                .attachments
                .iter()
                .map(|a| SendGridAttachment {
                    content: &a.content,
                    filename: &a.filename,
                    mime_type: &a.mime_type,
                    disposition: ATTACHMENT_DISPOSITION,
                })
                .collect(),
        }
    }
}

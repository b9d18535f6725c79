//! Delivery of composed emails.
//!
//! The delivery mechanism sits behind [`NotificationSink`] so the wizard
//! service can run against the real Resend API in production and an
//! in-memory mock in tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::message::{DeliveryReceipt, EmailMessage};
use crate::{MailerError, MailerResult};

/// Public Resend API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can deliver a composed notification email.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver the message, returning the provider's receipt.
    async fn deliver(&self, message: &EmailMessage) -> MailerResult<DeliveryReceipt>;
}

/// HTTP client for the Resend transactional email API.
pub struct ResendClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<SendAttachment<'a>>,
}

#[derive(Serialize)]
struct SendAttachment<'a> {
    filename: &'a str,
    content: &'a str,
    content_type: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

impl ResendClient {
    /// Create a client against the public Resend endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a client against a custom endpoint, e.g. a local stub.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_request_error(error: reqwest::Error) -> MailerError {
        if error.is_connect() {
            MailerError::Connect(error.to_string())
        } else if error.is_timeout() {
            MailerError::Timeout
        } else {
            MailerError::Delivery(error.to_string())
        }
    }
}

#[async_trait]
impl NotificationSink for ResendClient {
    async fn deliver(&self, message: &EmailMessage) -> MailerResult<DeliveryReceipt> {
        let body = SendRequest {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
            attachments: message
                .attachments
                .iter()
                .map(|a| SendAttachment {
                    filename: &a.filename,
                    content: &a.content,
                    content_type: &a.content_type,
                })
                .collect(),
        };

        tracing::debug!(
            to = %message.to.join(", "),
            attachments = message.attachments.len(),
            "sending referral email"
        );

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| MailerError::ResponseParse(e.to_string()))?;
        tracing::info!(id = %parsed.id, "referral email accepted");
        Ok(DeliveryReceipt { id: parsed.id })
    }
}

/// In-memory sink for tests: records every delivered message and can be
/// configured to fail.
#[derive(Default)]
pub struct MockSink {
    fail_with: Option<String>,
    deliveries: Mutex<Vec<EmailMessage>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails with the given message.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Messages delivered so far.
    pub fn deliveries(&self) -> Vec<EmailMessage> {
        self.deliveries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries().len()
    }
}

#[async_trait]
impl NotificationSink for MockSink {
    async fn deliver(&self, message: &EmailMessage) -> MailerResult<DeliveryReceipt> {
        if let Some(reason) = &self.fail_with {
            return Err(MailerError::Delivery(reason.clone()));
        }
        if let Ok(mut guard) = self.deliveries.lock() {
            guard.push(message.clone());
        }
        Ok(DeliveryReceipt {
            id: format!("mock-{}", self.delivery_count()),
        })
    }
}

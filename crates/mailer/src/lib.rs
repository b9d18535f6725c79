//! # Mailer
//!
//! Outbound boundary of the referral service: turns a completed referral
//! record into a deliverable email (HTML body, subject, attachments
//! including the optional FHIR bundle) and hands it to a notification sink.
//!
//! The sink is a trait so the wizard and the REST layer never know which
//! delivery provider is behind it; the production implementation talks to
//! the Resend HTTP API, tests use [`sink::MockSink`].
//!
//! Delivery is single-shot by contract: no internal retries, no queueing.
//! A failure is surfaced once and retried manually by the user.

pub mod compose;
pub mod config;
pub mod message;
pub mod sink;
pub mod template;

pub use compose::build_message;
pub use config::MailerConfig;
pub use message::{DeliveryReceipt, EmailAttachment, EmailMessage};
pub use sink::{MockSink, NotificationSink, ResendClient};

/// Errors returned by the mailer crate.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("invalid mailer configuration: {0}")]
    Config(String),
    #[error("could not connect to the delivery API at {0}")]
    Connect(String),
    #[error("delivery request timed out")]
    Timeout,
    #[error("delivery API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse delivery API response: {0}")]
    ResponseParse(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Type alias for Results that can fail with a [`MailerError`].
pub type MailerResult<T> = Result<T, MailerError>;

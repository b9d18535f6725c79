//! The rendered notification payload handed to a sink.

use serde::{Deserialize, Serialize};

/// One file attached to the outgoing email. Content is base64, the shape
/// the delivery API expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: String,
    pub content_type: String,
}

/// A fully rendered referral email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<EmailAttachment>,
}

/// Proof of acceptance returned by a sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider-assigned message id.
    pub id: String,
}

//! Assembling the outgoing email from a completed record.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use fhir::ReferralBundle;
use referral_core::ReferralRecord;

use crate::config::MailerConfig;
use crate::message::{EmailAttachment, EmailMessage};
use crate::template::{render_html, render_subject};

/// Build the notification email for a completed record.
///
/// Uploaded documents are passed through as-is. A machine-readable FHIR
/// bundle is appended as a JSON attachment; if bundle serialisation fails
/// the email still goes out without it, since the human-readable document
/// is the deliverable that must not be lost.
pub fn build_message(
    record: &ReferralRecord,
    config: &MailerConfig,
    generated_at: DateTime<Utc>,
) -> EmailMessage {
    let mut attachments: Vec<EmailAttachment> = record
        .attachments
        .iter()
        .map(|a| EmailAttachment {
            filename: a.filename.clone(),
            content: a.content.clone(),
            content_type: a.content_type.clone(),
        })
        .collect();

    match structured_attachment(record, generated_at) {
        Ok(bundle) => attachments.push(bundle),
        Err(error) => {
            tracing::warn!(%error, "skipping FHIR attachment, sending without it");
        }
    }

    EmailMessage {
        from: config.sender().to_string(),
        to: vec![config.recipient_for(record.destination).to_string()],
        subject: render_subject(record),
        html: render_html(record),
        attachments,
    }
}

fn structured_attachment(
    record: &ReferralRecord,
    generated_at: DateTime<Utc>,
) -> Result<EmailAttachment, fhir::FhirError> {
    let bundle = ReferralBundle::build(record, generated_at);
    let json = bundle.to_json()?;
    Ok(EmailAttachment {
        filename: ReferralBundle::attachment_filename(generated_at),
        content: BASE64.encode(json.as_bytes()),
        content_type: "application/json".to_string(),
    })
}

//! Client-supplied file attachments.
//!
//! Attachment content travels as base64 text on the wire (the same shape the
//! delivery API expects), so the record stores it encoded and only decodes
//! for content-type verification. Accepted types are PDF, JPEG and PNG;
//! the check sniffs the decoded bytes rather than trusting the declared
//! content type.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{ReferralError, ReferralResult};

/// MIME types an attachment may carry.
const ACCEPTED_MIME_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// A single attached file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    /// Original filename as supplied by the client.
    pub filename: String,
    /// Declared MIME type; informational only, the sniffed type governs.
    pub content_type: String,
    /// File content, base64 encoded.
    pub content: String,
}

impl Attachment {
    /// Build an attachment from raw bytes, encoding the content.
    pub fn from_bytes(filename: impl Into<String>, content_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: BASE64.encode(bytes),
        }
    }

    /// Decode the base64 content back into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::AttachmentDecode`] if the content is not
    /// valid base64.
    pub fn decode(&self) -> ReferralResult<Vec<u8>> {
        BASE64
            .decode(&self.content)
            .map_err(|source| ReferralError::AttachmentDecode {
                filename: self.filename.clone(),
                source,
            })
    }

    /// Verify the attachment decodes and sniffs as an accepted type.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::AttachmentDecode`] for malformed base64 and
    /// [`ReferralError::UnsupportedAttachmentType`] when the content is not
    /// a PDF, JPEG or PNG.
    pub fn verify(&self) -> ReferralResult<()> {
        let bytes = self.decode()?;
        let sniffed = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");
        if !ACCEPTED_MIME_TYPES.contains(&sniffed) {
            return Err(ReferralError::UnsupportedAttachmentType(
                self.filename.clone(),
            ));
        }
        Ok(())
    }
}

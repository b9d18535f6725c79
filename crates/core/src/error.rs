#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    #[error("a referral without an imaging examination cannot be submitted")]
    ImagingRequired,
    #[error("record path does not match the wizard path")]
    PathMismatch,
    #[error("the record cannot be edited in the current wizard state")]
    RecordLocked,
    #[error("this transition is not available in the current wizard state")]
    TransitionUnavailable,
    #[error("submission is only possible from the final step")]
    NotOnFinalStep,
    #[error("the record is incomplete; resolve the reported field errors first")]
    IncompleteRecord,
    #[error("a submission for this record is already in flight")]
    AlreadySubmitting,
    #[error("no submission is in flight")]
    NotSubmitting,
    #[error("the referral has not been submitted")]
    NotSubmitted,
    #[error("attachment '{filename}' is not a valid base64 payload: {source}")]
    AttachmentDecode {
        filename: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("attachment '{0}' has an unsupported content type (accepted: PDF, JPEG, PNG)")]
    UnsupportedAttachmentType(String),
}

pub type ReferralResult<T> = std::result::Result<T, ReferralError>;

//! FHIR boundary support for the referral service.
//!
//! This crate provides **wire models** and a builder for the structured
//! attachment that accompanies a submitted referral: a FHIR `collection`
//! Bundle carrying the patient identity, a clinical-findings observation,
//! a provisional condition and the referral service request.
//!
//! This crate focuses on:
//! - FHIR semantic alignment (without FHIR REST transport)
//! - JSON serialisation of the bundle
//! - translation from the referral record into wire structs
//!
//! Bundle generation is best-effort by contract: callers treat a failure
//! here as "no structured attachment", never as a submission failure.

pub mod bundle;

pub use bundle::ReferralBundle;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("failed to serialise bundle: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

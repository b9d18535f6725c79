//! # Referral Core
//!
//! Core logic for the sarcoma fast-track referral intake: the referral
//! record, file attachments, the declarative step tables for both referral
//! paths, the step validator and the wizard controller.
//!
//! Everything here is pure and synchronous. Rendering, delivery and HTTP
//! serving belong to the `mailer` and `api-rest` crates; this crate only
//! decides what a record contains, when a step may be left and how a
//! session moves between states.

pub mod attachment;
pub mod error;
pub mod record;
pub mod steps;
pub mod validation;
pub mod wizard;

#[cfg(test)]
pub(crate) mod test_support;

pub use attachment::Attachment;
pub use error::{ReferralError, ReferralResult};
pub use record::{ClinicianContact, ImagingExam, PatientContact, ReferralRecord};
pub use steps::{steps_for, StepDescriptor, StepKind};
pub use validation::{
    is_complete, is_valid_email, validate_record, validate_step, FieldErrors, ValidationRules,
};
pub use wizard::{Advance, Retreat, Wizard, WizardState};

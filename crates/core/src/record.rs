//! The referral record: the flat, mutable form state for one in-progress
//! submission.
//!
//! The record is created empty when a wizard session starts, mutated
//! field-by-field as the clinician progresses, and discarded after a
//! successful submission or when the session exits back to path selection.
//! It is never persisted.
//!
//! Both referral paths share one record shape; fields that only apply to
//! one path (anticoagulants and histology on the new-patient path, the
//! diagnosis summary on the consultation path) are simply left empty on the
//! other and never validated there.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use referral_types::{Destination, ImagingKind, ReferralPath, TriState};

use crate::Attachment;

/// One reported imaging examination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImagingExam {
    pub kind: ImagingKind,
    /// Examination date; requirement is governed by a configurable rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Findings description for this examination.
    #[serde(default)]
    pub description: String,
}

impl ImagingExam {
    pub fn new(kind: ImagingKind) -> Self {
        Self {
            kind,
            date: None,
            description: String::new(),
        }
    }
}

/// Contact details of the referring clinician.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClinicianContact {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl ClinicianContact {
    /// Display name for rendered documents.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Contact details of the referred patient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientContact {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    /// Insurance carrier code, e.g. "111" for VZP.
    #[serde(default)]
    pub insurance_code: String,
    /// National identifier (birth number).
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl PatientContact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The full form state for one referral.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReferralRecord {
    /// Which wizard branch this record belongs to. Immutable per session.
    pub path: ReferralPath,

    /// Suspicion reason (new-patient path) or consultation reason.
    #[serde(default)]
    pub reason: String,

    /// Was any imaging examination performed? `No` blocks the referral.
    #[serde(default)]
    pub has_imaging: TriState,
    /// Imaging kinds the clinician ticked.
    #[serde(default)]
    pub selected_imaging: Vec<ImagingKind>,
    /// Detail per ticked kind; entries without a matching tick are ignored.
    #[serde(default)]
    pub imaging_exams: Vec<ImagingExam>,

    /// Clinical history narrative.
    #[serde(default)]
    pub anamnesis: String,

    /// Anticoagulant medication (new-patient path only).
    #[serde(default)]
    pub on_anticoagulants: TriState,
    #[serde(default)]
    pub anticoagulant_details: String,

    /// Primary diagnosis and diagnostic summary (consultation path only).
    #[serde(default)]
    pub diagnosis: String,

    /// Histological verification (new-patient path only).
    #[serde(default)]
    pub has_histology: TriState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histology_date: Option<NaiveDate>,
    #[serde(default)]
    pub histology_result: String,

    /// Is the patient already booked for a follow-up examination?
    #[serde(default)]
    pub follow_up_scheduled: TriState,
    #[serde(default)]
    pub follow_up_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Images already shared through the ePACS imaging exchange.
    #[serde(default)]
    pub pacs_shared: bool,

    /// Receiving institution; required before submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,

    #[serde(default)]
    pub clinician: ClinicianContact,
    #[serde(default)]
    pub patient: PatientContact,
}

impl ReferralRecord {
    /// Create an empty record for the given path.
    pub fn new(path: ReferralPath) -> Self {
        Self {
            path,
            reason: String::new(),
            has_imaging: TriState::Unanswered,
            selected_imaging: Vec::new(),
            imaging_exams: Vec::new(),
            anamnesis: String::new(),
            on_anticoagulants: TriState::Unanswered,
            anticoagulant_details: String::new(),
            diagnosis: String::new(),
            has_histology: TriState::Unanswered,
            histology_date: None,
            histology_result: String::new(),
            follow_up_scheduled: TriState::Unanswered,
            follow_up_details: String::new(),
            follow_up_date: None,
            attachments: Vec::new(),
            pacs_shared: false,
            destination: None,
            clinician: ClinicianContact::default(),
            patient: PatientContact::default(),
        }
    }

    /// Look up the exam detail for a ticked imaging kind.
    pub fn exam_for(&self, kind: ImagingKind) -> Option<&ImagingExam> {
        self.imaging_exams.iter().find(|exam| exam.kind == kind)
    }

    /// The exams to render: one per ticked kind, in tick order, with its
    /// recorded detail when present.
    pub fn performed_exams(&self) -> Vec<ImagingExam> {
        self.selected_imaging
            .iter()
            .map(|&kind| {
                self.exam_for(kind)
                    .cloned()
                    .unwrap_or_else(|| ImagingExam::new(kind))
            })
            .collect()
    }

    /// Verify every attachment decodes and carries an accepted content type.
    ///
    /// # Errors
    ///
    /// Propagates the first attachment failure; see [`Attachment::verify`].
    pub fn verify_attachments(&self) -> crate::ReferralResult<()> {
        for attachment in &self.attachments {
            attachment.verify()?;
        }
        Ok(())
    }
}

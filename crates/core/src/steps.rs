//! Declarative step sequences for the two referral paths.
//!
//! Each path is an ordered table of step descriptors. The wizard walks the
//! table instead of hard-coding transitions, and a descriptor may carry a
//! skip predicate over the record so that step visibility follows earlier
//! answers.

use referral_types::ReferralPath;

use crate::ReferralRecord;

/// What a step collects. Validation rules are selected by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Suspicion or consultation reason plus the imaging gate question.
    Reason,
    /// Imaging kind selection and per-kind details.
    Imaging,
    /// Anamnesis plus path-specific fields (anticoagulants or diagnosis).
    History,
    /// Histological verification and follow-up booking (new-patient path).
    Histology,
    /// Follow-up booking only (consultation path).
    FollowUp,
    /// File attachments and the ePACS flag.
    Attachments,
    /// Destination and both contact blocks; the final step.
    Contact,
}

/// One entry in a path's step table.
pub struct StepDescriptor {
    pub kind: StepKind,
    pub label: &'static str,
    /// When present and true for the current record, the wizard walks past
    /// this step in both directions.
    pub skip: Option<fn(&ReferralRecord) -> bool>,
}

// The imaging step only applies while imaging is reported as performed.
// Answering "no" normally blocks at the reason step already; the predicate
// covers records whose answer changed after the reason step was passed.
fn skip_imaging(record: &ReferralRecord) -> bool {
    record.has_imaging.is_no()
}

const NEW_PATIENT_STEPS: [StepDescriptor; 6] = [
    StepDescriptor {
        kind: StepKind::Reason,
        label: "Suspicion",
        skip: None,
    },
    StepDescriptor {
        kind: StepKind::Imaging,
        label: "Imaging",
        skip: Some(skip_imaging),
    },
    StepDescriptor {
        kind: StepKind::History,
        label: "History",
        skip: None,
    },
    StepDescriptor {
        kind: StepKind::Histology,
        label: "Histology",
        skip: None,
    },
    StepDescriptor {
        kind: StepKind::Attachments,
        label: "Attachments",
        skip: None,
    },
    StepDescriptor {
        kind: StepKind::Contact,
        label: "Contact",
        skip: None,
    },
];

const CONSULTATION_STEPS: [StepDescriptor; 6] = [
    StepDescriptor {
        kind: StepKind::Reason,
        label: "Reason",
        skip: None,
    },
    StepDescriptor {
        kind: StepKind::Imaging,
        label: "Imaging",
        skip: Some(skip_imaging),
    },
    StepDescriptor {
        kind: StepKind::History,
        label: "Diagnosis",
        skip: None,
    },
    StepDescriptor {
        kind: StepKind::FollowUp,
        label: "Follow-up",
        skip: None,
    },
    StepDescriptor {
        kind: StepKind::Attachments,
        label: "Attachments",
        skip: None,
    },
    StepDescriptor {
        kind: StepKind::Contact,
        label: "Contact",
        skip: None,
    },
];

/// The ordered step table for a path.
pub fn steps_for(path: ReferralPath) -> &'static [StepDescriptor] {
    match path {
        ReferralPath::NewPatient => &NEW_PATIENT_STEPS,
        ReferralPath::Consultation => &CONSULTATION_STEPS,
    }
}

impl StepDescriptor {
    /// Should this step be walked past for the given record?
    pub fn is_skipped(&self, record: &ReferralRecord) -> bool {
        self.skip.map(|predicate| predicate(record)).unwrap_or(false)
    }
}

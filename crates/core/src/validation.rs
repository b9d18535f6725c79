//! Step-local validation of the referral record.
//!
//! The validator is a pure function from (record, step) to a map of field
//! errors; an empty map means the step may be left. It never looks at
//! fields belonging to another step and never mutates the record.
//!
//! Imaging checks are generated from the current selection set — one
//! description rule (and, under the strict date rule, one date rule) per
//! ticked kind — and then evaluated uniformly with every other check.

use std::collections::BTreeMap;

use referral_types::{ReferralPath, TriState};

use crate::steps::{steps_for, StepKind};
use crate::ReferralRecord;

/// Field name → human-readable message.
pub type FieldErrors = BTreeMap<String, String>;

const MSG_REQUIRED: &str = "This field is required";
const MSG_SELECT_IMAGING: &str = "Select at least one imaging examination";
const MSG_DATE_REQUIRED: &str = "Date is required";
const MSG_DESCRIPTION_REQUIRED: &str = "Description is required";
const MSG_HISTOLOGY_RESULT: &str = "Histology result description is required";
const MSG_INVALID_EMAIL: &str = "Invalid email format";
const MSG_SELECT_DESTINATION: &str = "Select a destination";

/// Tunable validation behaviour.
///
/// The imaging date requirement changed between product revisions; it is a
/// configuration switch rather than a hard-coded rule, relaxed by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationRules {
    /// Require a date for every selected imaging examination.
    pub require_imaging_dates: bool,
}

/// One generated field-level check.
struct FieldCheck {
    field: String,
    message: &'static str,
    satisfied: bool,
}

/// Basic `local@domain.tld` shape test.
///
/// Accepts exactly one `@`, no whitespace, a non-empty local part and a
/// domain with an interior dot. Deliverability is the sink's problem.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < domain.len() - 1)
}

/// Generate the per-selection imaging checks.
fn imaging_checks(record: &ReferralRecord, rules: ValidationRules) -> Vec<FieldCheck> {
    let mut checks = Vec::new();
    for &kind in &record.selected_imaging {
        let exam = record.exam_for(kind);
        if rules.require_imaging_dates {
            checks.push(FieldCheck {
                field: format!("{}_date", kind.wire_name()),
                message: MSG_DATE_REQUIRED,
                satisfied: exam.is_some_and(|e| e.date.is_some()),
            });
        }
        checks.push(FieldCheck {
            field: format!("{}_description", kind.wire_name()),
            message: MSG_DESCRIPTION_REQUIRED,
            satisfied: exam.is_some_and(|e| !e.description.trim().is_empty()),
        });
    }
    checks
}

fn require_text(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), MSG_REQUIRED.to_string());
    }
}

fn require_answer(errors: &mut FieldErrors, field: &str, answer: TriState) {
    if !answer.is_answered() {
        errors.insert(field.to_string(), MSG_REQUIRED.to_string());
    }
}

fn require_email(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), MSG_REQUIRED.to_string());
    } else if !is_valid_email(value.trim()) {
        errors.insert(field.to_string(), MSG_INVALID_EMAIL.to_string());
    }
}

/// Validate a single step of the record.
///
/// Returns a non-empty map naming every violated field at that step.
pub fn validate_step(
    record: &ReferralRecord,
    step: StepKind,
    rules: ValidationRules,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match step {
        StepKind::Reason => {
            require_text(&mut errors, "reason", &record.reason);
            require_answer(&mut errors, "has_imaging", record.has_imaging);
        }
        StepKind::Imaging => {
            if record.selected_imaging.is_empty() {
                errors.insert("imaging_kinds".into(), MSG_SELECT_IMAGING.into());
            }
            for check in imaging_checks(record, rules) {
                if !check.satisfied {
                    errors.insert(check.field, check.message.to_string());
                }
            }
        }
        StepKind::History => {
            require_text(&mut errors, "anamnesis", &record.anamnesis);
            match record.path {
                ReferralPath::NewPatient => {
                    require_answer(&mut errors, "on_anticoagulants", record.on_anticoagulants);
                }
                ReferralPath::Consultation => {
                    require_text(&mut errors, "diagnosis", &record.diagnosis);
                }
            }
        }
        StepKind::Histology => {
            // Result is required exactly when histology was performed.
            if record.has_histology.is_yes() && record.histology_result.trim().is_empty() {
                errors.insert("histology_result".into(), MSG_HISTOLOGY_RESULT.into());
            }
        }
        StepKind::FollowUp | StepKind::Attachments => {
            // Nothing is required here; follow-up detail and attachments are
            // always optional.
        }
        StepKind::Contact => {
            if record.destination.is_none() {
                errors.insert("destination".into(), MSG_SELECT_DESTINATION.into());
            }

            require_text(&mut errors, "clinician_first_name", &record.clinician.first_name);
            require_text(&mut errors, "clinician_last_name", &record.clinician.last_name);
            require_email(&mut errors, "clinician_email", &record.clinician.email);
            require_text(&mut errors, "clinician_phone", &record.clinician.phone);

            require_text(&mut errors, "patient_first_name", &record.patient.first_name);
            require_text(&mut errors, "patient_last_name", &record.patient.last_name);
            require_text(&mut errors, "patient_address", &record.patient.address);
            require_text(&mut errors, "patient_insurance", &record.patient.insurance_code);
            require_text(&mut errors, "patient_national_id", &record.patient.national_id);
            require_text(&mut errors, "patient_phone", &record.patient.phone);
            require_email(&mut errors, "patient_email", &record.patient.email);
        }
    }

    errors
}

/// Validate the whole record: every non-skipped step of its path, merged.
/// This is the submission gate.
pub fn validate_record(record: &ReferralRecord, rules: ValidationRules) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for step in steps_for(record.path) {
        if step.is_skipped(record) {
            continue;
        }
        errors.extend(validate_step(record, step.kind, rules));
    }
    errors
}

/// Is the record submittable?
pub fn is_complete(record: &ReferralRecord, rules: ValidationRules) -> bool {
    validate_record(record, rules).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ImagingExam;
    use chrono::NaiveDate;
    use referral_types::ImagingKind;

    fn record_a() -> ReferralRecord {
        ReferralRecord::new(ReferralPath::NewPatient)
    }

    fn complete_record() -> ReferralRecord {
        crate::test_support::complete_record(ReferralPath::NewPatient)
    }

    #[test]
    fn reason_step_requires_reason_and_answer() {
        let record = record_a();
        let errors = validate_step(&record, StepKind::Reason, ValidationRules::default());
        assert_eq!(errors.get("reason").map(String::as_str), Some(MSG_REQUIRED));
        assert!(errors.contains_key("has_imaging"));

        let mut record = record_a();
        record.reason = "  lump  ".into();
        record.has_imaging = TriState::No;
        let errors = validate_step(&record, StepKind::Reason, ValidationRules::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn whitespace_only_text_counts_as_empty() {
        let mut record = record_a();
        record.reason = "   \t ".into();
        record.has_imaging = TriState::Yes;
        let errors = validate_step(&record, StepKind::Reason, ValidationRules::default());
        assert!(errors.contains_key("reason"));
    }

    #[test]
    fn imaging_step_requires_a_selection() {
        let record = record_a();
        let errors = validate_step(&record, StepKind::Imaging, ValidationRules::default());
        assert_eq!(
            errors.get("imaging_kinds").map(String::as_str),
            Some(MSG_SELECT_IMAGING)
        );
    }

    #[test]
    fn each_selected_kind_needs_a_description() {
        let mut record = record_a();
        record.selected_imaging = vec![ImagingKind::Mri, ImagingKind::Ct];
        record.imaging_exams = vec![ImagingExam {
            kind: ImagingKind::Mri,
            date: None,
            description: "T2 hyperintense mass".into(),
        }];

        let errors = validate_step(&record, StepKind::Imaging, ValidationRules::default());
        assert!(!errors.contains_key("mri_description"));
        assert_eq!(
            errors.get("ct_description").map(String::as_str),
            Some(MSG_DESCRIPTION_REQUIRED)
        );

        // Filling the missing description unblocks the step.
        record.imaging_exams.push(ImagingExam {
            kind: ImagingKind::Ct,
            date: None,
            description: "Confirms the finding".into(),
        });
        let errors = validate_step(&record, StepKind::Imaging, ValidationRules::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn date_rule_is_configurable() {
        let mut record = record_a();
        record.selected_imaging = vec![ImagingKind::Mri];
        record.imaging_exams = vec![ImagingExam {
            kind: ImagingKind::Mri,
            date: None,
            description: "described".into(),
        }];

        let relaxed = validate_step(&record, StepKind::Imaging, ValidationRules::default());
        assert!(relaxed.is_empty());

        let strict = ValidationRules {
            require_imaging_dates: true,
        };
        let errors = validate_step(&record, StepKind::Imaging, strict);
        assert_eq!(errors.get("mri_date").map(String::as_str), Some(MSG_DATE_REQUIRED));

        record.imaging_exams[0].date = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert!(validate_step(&record, StepKind::Imaging, strict).is_empty());
    }

    #[test]
    fn history_step_branches_by_path() {
        let mut record = record_a();
        record.anamnesis = "unremarkable".into();
        let errors = validate_step(&record, StepKind::History, ValidationRules::default());
        assert!(errors.contains_key("on_anticoagulants"));
        assert!(!errors.contains_key("diagnosis"));

        let mut record = ReferralRecord::new(ReferralPath::Consultation);
        record.anamnesis = "unremarkable".into();
        let errors = validate_step(&record, StepKind::History, ValidationRules::default());
        assert!(errors.contains_key("diagnosis"));
        assert!(!errors.contains_key("on_anticoagulants"));
    }

    #[test]
    fn histology_result_required_iff_performed() {
        let mut record = record_a();

        record.has_histology = TriState::Unanswered;
        assert!(validate_step(&record, StepKind::Histology, ValidationRules::default()).is_empty());

        record.has_histology = TriState::No;
        assert!(validate_step(&record, StepKind::Histology, ValidationRules::default()).is_empty());

        record.has_histology = TriState::Yes;
        let errors = validate_step(&record, StepKind::Histology, ValidationRules::default());
        assert_eq!(
            errors.get("histology_result").map(String::as_str),
            Some(MSG_HISTOLOGY_RESULT)
        );

        record.histology_result = "Low-grade myxofibrosarcoma".into();
        assert!(validate_step(&record, StepKind::Histology, ValidationRules::default()).is_empty());
    }

    #[test]
    fn anticoagulant_detail_is_never_required() {
        let mut record = record_a();
        record.anamnesis = "unremarkable".into();
        record.on_anticoagulants = TriState::Yes;
        let errors = validate_step(&record, StepKind::History, ValidationRules::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn contact_step_requires_everything() {
        let record = record_a();
        let errors = validate_step(&record, StepKind::Contact, ValidationRules::default());
        for field in [
            "destination",
            "clinician_first_name",
            "clinician_last_name",
            "clinician_email",
            "clinician_phone",
            "patient_first_name",
            "patient_last_name",
            "patient_address",
            "patient_insurance",
            "patient_national_id",
            "patient_phone",
            "patient_email",
        ] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn email_shape_is_checked() {
        let mut record = complete_record();
        record.clinician.email = "not-an-email".into();
        let errors = validate_step(&record, StepKind::Contact, ValidationRules::default());
        assert_eq!(
            errors.get("clinician_email").map(String::as_str),
            Some(MSG_INVALID_EMAIL)
        );

        assert!(is_valid_email("doc@example.org"));
        assert!(is_valid_email("a.b@c.d.e"));
        assert!(!is_valid_email("doc@example"));
        assert!(!is_valid_email("doc@.org"));
        assert!(!is_valid_email("doc@example."));
        assert!(!is_valid_email("doc @example.org"));
        assert!(!is_valid_email("doc@ex@ample.org"));
        assert!(!is_valid_email("@example.org"));
    }

    #[test]
    fn complete_record_passes_every_step() {
        let record = complete_record();
        assert!(is_complete(&record, ValidationRules::default()));
        assert!(validate_record(&record, ValidationRules::default()).is_empty());
    }

    #[test]
    fn validate_record_merges_step_errors() {
        let mut record = complete_record();
        record.reason.clear();
        record.patient.email = "broken".into();
        let errors = validate_record(&record, ValidationRules::default());
        assert!(errors.contains_key("reason"));
        assert_eq!(
            errors.get("patient_email").map(String::as_str),
            Some(MSG_INVALID_EMAIL)
        );
        assert!(!is_complete(&record, ValidationRules::default()));
    }
}

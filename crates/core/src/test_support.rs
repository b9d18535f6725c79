//! Shared fixtures for unit tests.

use chrono::NaiveDate;
use referral_types::{Destination, ImagingKind, ReferralPath, TriState};

use crate::record::ImagingExam;
use crate::{ClinicianContact, PatientContact, ReferralRecord};

/// A record that passes every step of the given path.
pub(crate) fn complete_record(path: ReferralPath) -> ReferralRecord {
    let mut record = ReferralRecord::new(path);
    record.reason = "Rapidly growing mass on the left thigh".into();
    record.has_imaging = TriState::Yes;
    record.selected_imaging = vec![ImagingKind::Ultrasound];
    record.imaging_exams = vec![ImagingExam {
        kind: ImagingKind::Ultrasound,
        date: NaiveDate::from_ymd_opt(2024, 5, 2),
        description: "Hypoechogenic lesion, 45 mm".into(),
    }];
    record.anamnesis = "No prior oncological history".into();
    match path {
        ReferralPath::NewPatient => {
            record.on_anticoagulants = TriState::No;
            record.has_histology = TriState::No;
        }
        ReferralPath::Consultation => {
            record.diagnosis = "Suspected recurrence of liposarcoma".into();
        }
    }
    record.destination = Some(Destination::Prague);
    record.clinician = ClinicianContact {
        first_name: "Jan".into(),
        last_name: "Novák".into(),
        email: "doc@example.org".into(),
        phone: "+420 123 456 789".into(),
    };
    record.patient = PatientContact {
        first_name: "Petr".into(),
        last_name: "Svoboda".into(),
        address: "Hlavní 12, Praha".into(),
        insurance_code: "111".into(),
        national_id: "750312/1234".into(),
        phone: "+420 777 888 999".into(),
        email: "petr@example.org".into(),
    };
    record
}

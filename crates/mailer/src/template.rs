//! HTML rendering of the referral document.
//!
//! Pure text transform: a completed record in, the recipient-facing email
//! body out. Every populated field is rendered verbatim (HTML-escaped);
//! optional fields left empty render an em-dash placeholder rather than
//! disappearing, so the receiving team can see what was not filled in.

use chrono::NaiveDate;
use referral_types::{insurance_label, ReferralPath, TriState};

use referral_core::ReferralRecord;

/// Placeholder for optional fields left empty.
pub const PLACEHOLDER: &str = "—";

const SECTION_STYLE: &str =
    "background-color: rgba(0, 0, 0, 0.03); border-radius: 8px; padding: 16px; margin-bottom: 16px;";
const SECTION_TITLE_STYLE: &str = "margin: 0 0 8px 0; font-size: 11px; font-weight: 600; \
     color: #6b7280; text-transform: uppercase; letter-spacing: 0.5px;";
const BODY_TEXT_STYLE: &str = "margin: 0; font-size: 14px; color: #1a1a1a; line-height: 1.5;";
const MUTED_TEXT_STYLE: &str = "font-size: 12px; color: #6b7280;";

/// Escape text for embedding into HTML content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn text_or_placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        escape_html(value.trim())
    }
}

fn date_or_placeholder(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn section(title: &str, body: &str) -> String {
    format!(
        "<div style=\"{SECTION_STYLE}\">\
           <h4 style=\"{SECTION_TITLE_STYLE}\">{title}</h4>\
           {body}\
         </div>"
    )
}

fn contact_row(label: &str, value: &str) -> String {
    format!(
        "<tr>\
           <td style=\"padding: 4px 0; color: #6b7280; width: 110px;\">{label}</td>\
           <td style=\"padding: 4px 0; color: #1a1a1a;\">{}</td>\
         </tr>",
        text_or_placeholder(value)
    )
}

/// Subject line for the outgoing email.
pub fn render_subject(record: &ReferralRecord) -> String {
    format!("{} – sarcoma referral", record.patient.full_name().trim())
}

/// The anticoagulant status line. A "yes" answer is a safety-relevant
/// highlight for the receiving team.
fn anticoagulant_html(record: &ReferralRecord) -> String {
    match record.on_anticoagulants {
        TriState::Yes => {
            let detail = if record.anticoagulant_details.trim().is_empty() {
                String::new()
            } else {
                format!(" ({})", escape_html(record.anticoagulant_details.trim()))
            };
            format!(
                "<div style=\"margin-top: 12px; background-color: #fef2f2; \
                   border: 1px solid #fecaca; border-radius: 6px; padding: 10px 12px;\">\
                   <span style=\"font-size: 12px; color: #dc2626; font-weight: 600;\">\
                   ⚠️ Anticoagulants: Yes{detail}</span>\
                 </div>"
            )
        }
        TriState::No => format!(
            "<div style=\"margin-top: 8px; {MUTED_TEXT_STYLE}\">\
               <span style=\"font-weight: 500;\">Anticoagulants:</span> No\
             </div>"
        ),
        TriState::Unanswered => format!(
            "<div style=\"margin-top: 8px; {MUTED_TEXT_STYLE}\">\
               <span style=\"font-weight: 500;\">Anticoagulants:</span> {PLACEHOLDER}\
             </div>"
        ),
    }
}

fn imaging_html(record: &ReferralRecord) -> String {
    let mut entries = String::new();
    for exam in record.performed_exams() {
        entries.push_str(&format!(
            "<div style=\"margin-bottom: 8px;\">\
               <span style=\"font-weight: 600; color: #1a1a1a;\">{}</span>\
               <span style=\"color: #6b7280;\"> — {}</span>\
               <p style=\"{MUTED_TEXT_STYLE} margin: 4px 0 0 0;\">{}</p>\
             </div>",
            exam.kind.label(),
            date_or_placeholder(exam.date),
            text_or_placeholder(&exam.description),
        ));
    }
    if entries.is_empty() {
        entries = format!("<p style=\"{BODY_TEXT_STYLE}\">{PLACEHOLDER}</p>");
    }

    if record.path == ReferralPath::NewPatient {
        entries.push_str(&histology_html(record));
    }
    entries.push_str(&follow_up_html(record));
    entries
}

fn histology_html(record: &ReferralRecord) -> String {
    let status = if record.has_histology.is_yes() {
        format!(
            "<span style=\"{MUTED_TEXT_STYLE}\"> {}</span>\
             <p style=\"{MUTED_TEXT_STYLE} margin: 4px 0 0 0;\">{}</p>",
            date_or_placeholder(record.histology_date),
            text_or_placeholder(&record.histology_result),
        )
    } else {
        format!("<span style=\"{MUTED_TEXT_STYLE}\"> not performed</span>")
    };
    format!(
        "<div style=\"margin-top: 12px; padding-top: 12px; border-top: 1px solid #e5e7eb;\">\
           <span style=\"font-size: 12px; font-weight: 600; color: #1a1a1a;\">Histology:</span>\
           {status}\
         </div>"
    )
}

fn follow_up_html(record: &ReferralRecord) -> String {
    if !record.follow_up_scheduled.is_yes() {
        return String::new();
    }
    format!(
        "<div style=\"margin-top: 12px; padding-top: 12px; border-top: 1px solid #e5e7eb;\">\
           <span style=\"font-size: 12px; font-weight: 600; color: #1a1a1a;\">\
           Booked follow-up:</span>\
           <span style=\"{MUTED_TEXT_STYLE}\"> {} — {}</span>\
         </div>",
        text_or_placeholder(&record.follow_up_details),
        date_or_placeholder(record.follow_up_date),
    )
}

fn pacs_html(record: &ReferralRecord) -> String {
    if !record.pacs_shared {
        return String::new();
    }
    "<div style=\"background-color: rgba(234, 179, 8, 0.1); border-left: 3px solid #eab308; \
       padding: 12px 16px; margin-bottom: 16px; border-radius: 0 8px 8px 0;\">\
       <p style=\"margin: 0; font-size: 13px; color: #92400e;\">\
       <strong>Note:</strong> Images have been shared via ePACS.</p>\
     </div>"
        .to_string()
}

/// Render the recipient-facing referral document.
pub fn render_html(record: &ReferralRecord) -> String {
    let header = format!(
        "<div style=\"background: linear-gradient(135deg, rgba(234, 179, 8, 0.3), \
           rgba(234, 179, 8, 0.1)); border-radius: 12px; padding: 24px; margin-bottom: 24px; \
           border: 1px solid rgba(234, 179, 8, 0.3);\">\
           <span style=\"background-color: rgba(234, 179, 8, 0.2); color: #92400e; \
             font-size: 11px; font-weight: 600; padding: 4px 10px; border-radius: 20px;\">\
             Sarcoma Referral</span>\
           <h1 style=\"margin: 8px 0 0 0; font-size: 22px; font-weight: 700; color: #1a1a1a;\">{}</h1>\
           <p style=\"margin: 4px 0 0 0; color: #6b7280; font-size: 14px;\">{}</p>\
         </div>",
        text_or_placeholder(&record.patient.full_name()),
        record.path.label(),
    );

    let reason_title = match record.path {
        ReferralPath::NewPatient => "Reason for suspicion",
        ReferralPath::Consultation => "Reason for consultation",
    };
    let reason = section(
        reason_title,
        &format!(
            "<p style=\"{BODY_TEXT_STYLE}\">{}</p>",
            text_or_placeholder(&record.reason)
        ),
    );

    let mut history_body = format!(
        "<p style=\"{BODY_TEXT_STYLE}\">{}</p>",
        text_or_placeholder(&record.anamnesis)
    );
    match record.path {
        ReferralPath::NewPatient => history_body.push_str(&anticoagulant_html(record)),
        ReferralPath::Consultation => history_body.push_str(&format!(
            "<div style=\"margin-top: 12px;\">\
               <span style=\"font-size: 12px; font-weight: 600; color: #1a1a1a;\">Diagnosis:</span>\
               <p style=\"{MUTED_TEXT_STYLE} margin: 4px 0 0 0;\">{}</p>\
             </div>",
            text_or_placeholder(&record.diagnosis)
        )),
    }
    let history = section("Anamnesis", &history_body);

    let imaging = section("Imaging examinations", &imaging_html(record));

    let destination_name = record
        .destination
        .map(|d| d.full_name().to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let destination = section(
        "Destination",
        &format!("<p style=\"{BODY_TEXT_STYLE}\">{}</p>", escape_html(&destination_name)),
    );

    let clinician = section(
        "Referring clinician",
        &format!(
            "<table style=\"width: 100%; font-size: 14px; border-collapse: collapse;\">{}{}{}</table>",
            contact_row("Name", &record.clinician.full_name()),
            contact_row("Email", &record.clinician.email),
            contact_row("Phone", &record.clinician.phone),
        ),
    );

    let insurance = insurance_label(record.patient.insurance_code.trim())
        .map(str::to_string)
        .unwrap_or_else(|| record.patient.insurance_code.clone());
    let patient = section(
        "Patient",
        &format!(
            "<table style=\"width: 100%; font-size: 14px; border-collapse: collapse;\">{}{}{}{}{}{}</table>",
            contact_row("Name", &record.patient.full_name()),
            contact_row("Birth number", &record.patient.national_id),
            contact_row("Insurance", &insurance),
            contact_row("Address", &record.patient.address),
            contact_row("Phone", &record.patient.phone),
            contact_row("Email", &record.patient.email),
        ),
    );

    let footer = "<div style=\"margin-top: 24px; padding: 16px; \
         background-color: rgba(0, 0, 0, 0.02); border: 1px solid #e5e7eb; border-radius: 8px;\">\
         <p style=\"margin: 0; font-size: 11px; color: #6b7280; text-align: center;\">\
         This document contains sensitive personal data. Handle it in accordance with the GDPR.\
         </p></div>";

    format!(
        "<!DOCTYPE html>\
         <html>\
         <head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\"></head>\
         <body style=\"margin: 0; padding: 0; background-color: #f8f9fa; \
           font-family: -apple-system, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;\">\
         <div style=\"max-width: 600px; margin: 0 auto; padding: 24px;\">\
         {header}{reason}{history}{imaging}{}{destination}{clinician}{patient}{footer}\
         </div></body></html>",
        pacs_html(record),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use referral_core::record::ImagingExam;
    use referral_types::{Destination, ImagingKind};

    fn populated_record() -> ReferralRecord {
        let mut record = ReferralRecord::new(ReferralPath::NewPatient);
        record.reason = "Rapidly growing mass".into();
        record.has_imaging = TriState::Yes;
        record.selected_imaging = vec![ImagingKind::Mri, ImagingKind::Ultrasound];
        record.imaging_exams = vec![
            ImagingExam {
                kind: ImagingKind::Mri,
                date: NaiveDate::from_ymd_opt(2024, 4, 12),
                description: "T2 hyperintense lesion".into(),
            },
            ImagingExam {
                kind: ImagingKind::Ultrasound,
                date: None,
                description: "45 mm hypoechogenic mass".into(),
            },
        ];
        record.anamnesis = "Hypertension, otherwise unremarkable".into();
        record.on_anticoagulants = TriState::Yes;
        record.anticoagulant_details = "Warfarin 5 mg".into();
        record.has_histology = TriState::Yes;
        record.histology_date = NaiveDate::from_ymd_opt(2024, 4, 20);
        record.histology_result = "Low-grade myxofibrosarcoma".into();
        record.pacs_shared = true;
        record.destination = Some(Destination::Prague);
        record.clinician.first_name = "Jan".into();
        record.clinician.last_name = "Novák".into();
        record.clinician.email = "doc@example.org".into();
        record.clinician.phone = "+420 123 456 789".into();
        record.patient.first_name = "Petr".into();
        record.patient.last_name = "Svoboda".into();
        record.patient.address = "Hlavní 12, Praha".into();
        record.patient.insurance_code = "111".into();
        record.patient.national_id = "750312/1234".into();
        record.patient.phone = "+420 777 888 999".into();
        record.patient.email = "petr@example.org".into();
        record
    }

    #[test]
    fn renders_every_populated_field() {
        let html = render_html(&populated_record());
        for expected in [
            "Rapidly growing mass",
            "Hypertension, otherwise unremarkable",
            "T2 hyperintense lesion",
            "45 mm hypoechogenic mass",
            "2024-04-12",
            "Low-grade myxofibrosarcoma",
            "Fakultní nemocnice Motol",
            "Jan Novák",
            "doc@example.org",
            "Petr Svoboda",
            "750312/1234",
            "VZP (111)",
            "Hlavní 12, Praha",
            "petr@example.org",
            "ePACS",
        ] {
            assert!(html.contains(expected), "missing {expected:?} in rendered output");
        }
    }

    #[test]
    fn empty_optionals_render_a_placeholder_not_nothing() {
        let mut record = populated_record();
        record.imaging_exams[1].description.clear();
        let html = render_html(&record);
        // The ultrasound entry is still present, with a placeholder
        // description and a placeholder date.
        assert!(html.contains("Ultrasound"));
        assert!(html.contains(PLACEHOLDER));
    }

    #[test]
    fn anticoagulant_yes_is_highlighted() {
        let html = render_html(&populated_record());
        assert!(html.contains("Anticoagulants: Yes (Warfarin 5 mg)"));
        assert!(html.contains("#dc2626"), "highlight styling present");

        let mut record = populated_record();
        record.on_anticoagulants = TriState::No;
        record.anticoagulant_details.clear();
        let html = render_html(&record);
        assert!(html.contains("Anticoagulants:</span> No"));
        assert!(!html.contains("⚠️"));
    }

    #[test]
    fn histology_status_follows_the_answer() {
        let html = render_html(&populated_record());
        assert!(html.contains("Histology:"));
        assert!(html.contains("2024-04-20"));

        let mut record = populated_record();
        record.has_histology = TriState::No;
        let html = render_html(&record);
        assert!(html.contains("not performed"));
        assert!(!html.contains("Low-grade myxofibrosarcoma"));
    }

    #[test]
    fn consultation_path_renders_diagnosis_instead() {
        let mut record = ReferralRecord::new(ReferralPath::Consultation);
        record.anamnesis = "Treated liposarcoma 2019".into();
        record.diagnosis = "Suspected recurrence".into();
        let html = render_html(&record);
        assert!(html.contains("Diagnosis:"));
        assert!(html.contains("Suspected recurrence"));
        assert!(html.contains("Reason for consultation"));
        assert!(!html.contains("Anticoagulants"));
        assert!(!html.contains("Histology:"));
    }

    #[test]
    fn field_values_are_html_escaped() {
        let mut record = populated_record();
        record.reason = "size <5cm> & \"growing\"".into();
        let html = render_html(&record);
        assert!(html.contains("size &lt;5cm&gt; &amp; &quot;growing&quot;"));
        assert!(!html.contains("<5cm>"));
    }

    #[test]
    fn pacs_note_only_when_shared() {
        let mut record = populated_record();
        record.pacs_shared = false;
        assert!(!render_html(&record).contains("ePACS"));
    }

    #[test]
    fn subject_names_the_patient() {
        assert_eq!(
            render_subject(&populated_record()),
            "Petr Svoboda – sarcoma referral"
        );
    }
}

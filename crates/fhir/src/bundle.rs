//! Referral bundle wire model and builder.
//!
//! The bundle is a `collection` of four resources generated from one
//! completed referral record:
//!
//! - `Patient` — identity, telecom and address of the referred patient
//! - `Observation` — a progress-note observation summarising the clinical
//!   findings narrative
//! - `Condition` — the provisional suspected-sarcoma diagnosis
//! - `ServiceRequest` — the referral itself, linking requester, performer
//!   and the condition
//!
//! Wire structs are internal; [`ReferralBundle`] is the public facade.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use referral_core::ReferralRecord;

use crate::FhirResult;

/// Identifier system for the national identifier (birth number).
const NATIONAL_ID_SYSTEM: &str = "urn:oid:2.16.840.1.113883.2.4.6.3";
const LOINC: &str = "http://loinc.org";
const SNOMED: &str = "http://snomed.info/sct";
const CONDITION_CLINICAL: &str = "http://terminology.hl7.org/CodeSystem/condition-clinical";
const CONDITION_VER_STATUS: &str = "http://terminology.hl7.org/CodeSystem/condition-ver-status";
const CONDITION_CATEGORY: &str = "http://terminology.hl7.org/CodeSystem/condition-category";

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Coding {
    system: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display: Option<String>,
}

impl Coding {
    fn new(system: &str, code: &str, display: Option<&str>) -> Self {
        Self {
            system: system.to_string(),
            code: code.to_string(),
            display: display.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display: Option<String>,
}

impl Reference {
    fn to_resource(id: &str) -> Self {
        Self {
            reference: Some(format!("urn:uuid:{id}")),
            display: None,
        }
    }

    fn display_only(display: impl Into<String>) -> Self {
        Self {
            reference: None,
            display: Some(display.into()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Identifier {
    system: String,
    value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct HumanNameWire {
    text: String,
    family: String,
    given: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct ContactPoint {
    system: String,
    value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct AddressWire {
    text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct PatientWire {
    resource_type: String,
    id: String,
    identifier: Vec<Identifier>,
    name: Vec<HumanNameWire>,
    telecom: Vec<ContactPoint>,
    address: Vec<AddressWire>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct ObservationWire {
    resource_type: String,
    id: String,
    status: String,
    code: CodeableConcept,
    subject: Reference,
    effective_date_time: String,
    value_string: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct ConditionWire {
    resource_type: String,
    id: String,
    clinical_status: CodeableConcept,
    verification_status: CodeableConcept,
    category: Vec<CodeableConcept>,
    code: CodeableConcept,
    subject: Reference,
    onset_date_time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct ServiceRequestWire {
    resource_type: String,
    id: String,
    status: String,
    intent: String,
    category: Vec<CodeableConcept>,
    code: CodeableConcept,
    subject: Reference,
    reason_reference: Vec<Reference>,
    requester: Reference,
    performer: Vec<Reference>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
enum ResourceWire {
    Patient(PatientWire),
    Observation(ObservationWire),
    Condition(ConditionWire),
    ServiceRequest(ServiceRequestWire),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct EntryWire {
    #[serde(rename = "fullUrl")]
    full_url: String,
    resource: ResourceWire,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct BundleWire {
    resource_type: String,
    #[serde(rename = "type")]
    bundle_type: String,
    timestamp: String,
    entry: Vec<EntryWire>,
}

// ============================================================================
// Public facade
// ============================================================================

/// The structured attachment for one submitted referral.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferralBundle {
    wire: BundleWire,
}

impl ReferralBundle {
    /// Build a bundle from a completed record.
    ///
    /// Missing optional data never fails the build; optional elements are
    /// simply omitted. Resource ids are freshly generated per call.
    pub fn build(record: &ReferralRecord, generated_at: DateTime<Utc>) -> Self {
        let patient_id = prefixed_id("pat");
        let observation_id = prefixed_id("obs");
        let condition_id = prefixed_id("cond");
        let request_id = prefixed_id("req");
        let timestamp = generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);

        let patient = PatientWire {
            resource_type: "Patient".into(),
            id: patient_id.clone(),
            identifier: vec![Identifier {
                system: NATIONAL_ID_SYSTEM.into(),
                value: record.patient.national_id.clone(),
            }],
            name: vec![HumanNameWire {
                text: record.patient.full_name(),
                family: record.patient.last_name.clone(),
                given: vec![record.patient.first_name.clone()],
            }],
            telecom: patient_telecom(record),
            address: vec![AddressWire {
                text: record.patient.address.clone(),
            }],
        };

        let observation = ObservationWire {
            resource_type: "Observation".into(),
            id: observation_id.clone(),
            status: "final".into(),
            code: CodeableConcept {
                coding: vec![Coding::new(LOINC, "11506-3", Some("Progress note"))],
                text: Some("Clinical findings".into()),
            },
            subject: Reference::to_resource(&patient_id),
            effective_date_time: timestamp.clone(),
            value_string: clinical_findings(record),
        };

        let condition = ConditionWire {
            resource_type: "Condition".into(),
            id: condition_id.clone(),
            clinical_status: CodeableConcept {
                coding: vec![Coding::new(CONDITION_CLINICAL, "active", None)],
                text: None,
            },
            verification_status: CodeableConcept {
                coding: vec![Coding::new(CONDITION_VER_STATUS, "provisional", None)],
                text: None,
            },
            category: vec![CodeableConcept {
                coding: vec![Coding::new(CONDITION_CATEGORY, "encounter-diagnosis", None)],
                text: None,
            }],
            code: CodeableConcept {
                coding: vec![Coding::new(SNOMED, "424413001", Some("Soft tissue sarcoma"))],
                text: Some("Suspected sarcoma".into()),
            },
            subject: Reference::to_resource(&patient_id),
            onset_date_time: timestamp.clone(),
        };

        let request = ServiceRequestWire {
            resource_type: "ServiceRequest".into(),
            id: request_id.clone(),
            status: "active".into(),
            intent: "order".into(),
            category: vec![CodeableConcept {
                coding: vec![Coding::new(SNOMED, "3457005", Some("Referral"))],
                text: None,
            }],
            code: CodeableConcept {
                coding: Vec::new(),
                text: Some("Referral for sarcoma evaluation".into()),
            },
            subject: Reference::to_resource(&patient_id),
            reason_reference: vec![Reference::to_resource(&condition_id)],
            requester: Reference::display_only(record.clinician.full_name()),
            performer: vec![Reference::display_only(performer_display(record))],
        };

        let wire = BundleWire {
            resource_type: "Bundle".into(),
            bundle_type: "collection".into(),
            timestamp,
            entry: vec![
                EntryWire {
                    full_url: format!("urn:uuid:{patient_id}"),
                    resource: ResourceWire::Patient(patient),
                },
                EntryWire {
                    full_url: format!("urn:uuid:{observation_id}"),
                    resource: ResourceWire::Observation(observation),
                },
                EntryWire {
                    full_url: format!("urn:uuid:{condition_id}"),
                    resource: ResourceWire::Condition(condition),
                },
                EntryWire {
                    full_url: format!("urn:uuid:{request_id}"),
                    resource: ResourceWire::ServiceRequest(request),
                },
            ],
        };

        Self { wire }
    }

    /// Render the bundle as pretty-printed JSON for the email attachment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError::Serialization`] if serialisation fails.
    pub fn to_json(&self) -> FhirResult<String> {
        Ok(serde_json::to_string_pretty(&self.wire)?)
    }

    /// Attachment filename for a bundle generated at the given instant.
    pub fn attachment_filename(generated_at: DateTime<Utc>) -> String {
        format!(
            "sarcoma-fasttrack-referral-fhir-{}.json",
            generated_at.format("%Y-%m-%dT%H-%M-%S")
        )
    }
}

fn prefixed_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn patient_telecom(record: &ReferralRecord) -> Vec<ContactPoint> {
    let mut telecom = vec![ContactPoint {
        system: "phone".into(),
        value: record.patient.phone.clone(),
    }];
    if !record.patient.email.trim().is_empty() {
        telecom.push(ContactPoint {
            system: "email".into(),
            value: record.patient.email.clone(),
        });
    }
    telecom
}

/// Join the narrative fields into the observation value.
fn clinical_findings(record: &ReferralRecord) -> String {
    let mut findings = Vec::new();
    if !record.reason.trim().is_empty() {
        findings.push(format!("Reason for referral: {}", record.reason));
    }
    if !record.anamnesis.trim().is_empty() {
        findings.push(format!("Anamnesis: {}", record.anamnesis));
    }
    if !record.diagnosis.trim().is_empty() {
        findings.push(format!("Diagnosis: {}", record.diagnosis));
    }
    if record.on_anticoagulants.is_yes() && !record.anticoagulant_details.trim().is_empty() {
        findings.push(format!("Anticoagulants: {}", record.anticoagulant_details));
    }
    findings.join("\n")
}

fn performer_display(record: &ReferralRecord) -> String {
    record
        .destination
        .map(|destination| destination.full_name().to_string())
        .unwrap_or_default()
}

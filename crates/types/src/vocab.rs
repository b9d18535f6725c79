//! Enumerated referral vocabulary shared across crates and the REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The branch of the wizard a referral follows.
///
/// The path is chosen before the wizard starts and determines which steps
/// and fields apply; it never changes for an in-progress referral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferralPath {
    /// New patient with a fresh suspicion of sarcoma.
    NewPatient,
    /// Existing patient referred for consultation of a new finding.
    Consultation,
}

impl ReferralPath {
    /// Human-readable path description, used in rendered output.
    pub fn label(self) -> &'static str {
        match self {
            ReferralPath::NewPatient => "New patient with suspected sarcoma",
            ReferralPath::Consultation => "Consultation for an existing patient",
        }
    }
}

/// A yes/no question that also tracks "not answered yet".
///
/// Unanswered is distinct from `No`: required tri-state questions block
/// wizard progression until answered either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    #[default]
    Unanswered,
    Yes,
    No,
}

impl TriState {
    pub fn is_yes(self) -> bool {
        self == TriState::Yes
    }

    pub fn is_no(self) -> bool {
        self == TriState::No
    }

    pub fn is_answered(self) -> bool {
        self != TriState::Unanswered
    }
}

/// Kinds of imaging examination a referral can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImagingKind {
    Ultrasound,
    Mri,
    Ct,
    PetCt,
    PetMri,
}

impl ImagingKind {
    /// Every kind, in the order the form presents them.
    pub const ALL: [ImagingKind; 5] = [
        ImagingKind::Ultrasound,
        ImagingKind::Mri,
        ImagingKind::Ct,
        ImagingKind::PetCt,
        ImagingKind::PetMri,
    ];

    /// Display label used in rendered documents.
    pub fn label(self) -> &'static str {
        match self {
            ImagingKind::Ultrasound => "Ultrasound",
            ImagingKind::Mri => "MRI",
            ImagingKind::Ct => "CT",
            ImagingKind::PetCt => "PET/CT",
            ImagingKind::PetMri => "PET/MRI",
        }
    }

    /// Stable wire name, matching the serde representation. Used to build
    /// per-kind validation field keys such as `mri_description`.
    pub fn wire_name(self) -> &'static str {
        match self {
            ImagingKind::Ultrasound => "ultrasound",
            ImagingKind::Mri => "mri",
            ImagingKind::Ct => "ct",
            ImagingKind::PetCt => "pet_ct",
            ImagingKind::PetMri => "pet_mri",
        }
    }
}

/// Receiving institution a referral is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Prague,
    Brno,
}

impl Destination {
    /// Short city label shown in selection UIs.
    pub fn label(self) -> &'static str {
        match self {
            Destination::Prague => "Prague",
            Destination::Brno => "Brno",
        }
    }

    /// Full institution name, rendered in the referral document.
    pub fn full_name(self) -> &'static str {
        match self {
            Destination::Prague => "Fakultní nemocnice Motol",
            Destination::Brno => "Masarykův onkologický ústav",
        }
    }
}

/// Resolve an insurance carrier code to its display label.
///
/// Returns `None` for unknown codes; callers fall back to showing the raw
/// code so an unexpected carrier never blanks out the rendered document.
pub fn insurance_label(code: &str) -> Option<&'static str> {
    match code {
        "111" => Some("VZP (111)"),
        "201" => Some("VoZP (201)"),
        "205" => Some("ČPZP (205)"),
        "207" => Some("OZP (207)"),
        "209" => Some("ZPŠ (209)"),
        "211" => Some("ZPMV (211)"),
        "213" => Some("RBP (213)"),
        _ => None,
    }
}

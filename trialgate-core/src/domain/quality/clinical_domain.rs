// trialgate-core/src/domain/quality/clinical_domain.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// The SDTM domains the engine knows how to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClinicalDomain {
    Demographics,
    AdverseEvent,
    VitalSign,
    LabResult,
}

impl ClinicalDomain {
    pub const ALL: [ClinicalDomain; 4] = [
        Self::Demographics,
        Self::AdverseEvent,
        Self::VitalSign,
        Self::LabResult,
    ];

    /// Two-letter SDTM code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Demographics => "DM",
            Self::AdverseEvent => "AE",
            Self::VitalSign => "VS",
            Self::LabResult => "LB",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            Self::Demographics => "demographics",
            Self::AdverseEvent => "adverse_event",
            Self::VitalSign => "vital_sign",
            Self::LabResult => "lab_result",
        }
    }

    pub fn subject_field(&self) -> &'static str {
        "USUBJID"
    }

    /// Per-subject sequence number. DM has one row per subject and no sequence.
    pub fn sequence_field(&self) -> Option<&'static str> {
        match self {
            Self::Demographics => None,
            Self::AdverseEvent => Some("AESEQ"),
            Self::VitalSign => Some("VSSEQ"),
            Self::LabResult => Some("LBSEQ"),
        }
    }
}

impl fmt::Display for ClinicalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ClinicalDomain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "dm" | "demographics" => Ok(Self::Demographics),
            "ae" | "adverse_event" | "adverse_events" => Ok(Self::AdverseEvent),
            "vs" | "vital_sign" | "vital_signs" => Ok(Self::VitalSign),
            "lb" | "lab_result" | "lab_results" => Ok(Self::LabResult),
            _ => Err(DomainError::UnknownDomain(s.to_string())),
        }
    }
}

// Serialized as the SDTM code so audit records stay compact and stable.
impl Serialize for ClinicalDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for ClinicalDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ClinicalDomain::from_str(&s).map_err(serde::de::Error::custom)
    }
}

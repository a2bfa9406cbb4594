// trialgate-core/src/domain/promotion/policy.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::quality::QualityReport;

/// Tolerated failure counts for a batch to be promoted.
/// Default: no ERROR failure, any number of WARNING failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PromotionPolicy {
    #[serde(default)]
    pub max_error_failures: usize,

    /// `None` means unlimited.
    #[serde(default)]
    pub max_warning_failures: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Promote,
    Quarantine,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promote => "PROMOTE",
            Self::Quarantine => "QUARANTINE",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PromotionPolicy {
    pub fn strict() -> Self {
        Self {
            max_error_failures: 0,
            max_warning_failures: Some(0),
        }
    }

    pub fn with_max_warnings(mut self, max: usize) -> Self {
        self.max_warning_failures = Some(max);
        self
    }

    /// Pure evaluation: the decision and a human-readable reason.
    pub fn evaluate(&self, report: &QualityReport) -> (Decision, String) {
        if report.error_failures > self.max_error_failures {
            return (
                Decision::Quarantine,
                format!(
                    "{} ERROR failure(s) exceed the tolerated {} ({} of {} records affected)",
                    report.error_failures,
                    self.max_error_failures,
                    report.records_with_errors,
                    report.total_records
                ),
            );
        }

        if let Some(max_warnings) = self.max_warning_failures
            && report.warning_failures > max_warnings
        {
            return (
                Decision::Quarantine,
                format!(
                    "{} WARNING failure(s) exceed the tolerated {}",
                    report.warning_failures, max_warnings
                ),
            );
        }

        let reason = if report.zero_records {
            "empty batch, nothing to reject".to_string()
        } else {
            format!(
                "{} ERROR / {} WARNING failure(s) within policy, completeness {:.1}%",
                report.error_failures, report.warning_failures, report.completeness_pct
            )
        };
        (Decision::Promote, reason)
    }
}

// trialgate-core/src/domain/quality/outcome.rs

use serde::{Deserialize, Serialize};

use super::record::RecordIdentifier;
use super::severity::Severity;

/// Result of one rule applied to one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub record: RecordIdentifier,
    pub passed: bool,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuleOutcome {
    pub fn pass(rule_id: &str, record: RecordIdentifier, severity: Severity) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            record,
            passed: true,
            severity,
            message: None,
        }
    }

    pub fn fail(
        rule_id: &str,
        record: RecordIdentifier,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            record,
            passed: false,
            severity,
            message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.passed && self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        !self.passed && self.severity == Severity::Warning
    }
}

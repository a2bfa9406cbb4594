// trialgate-core/src/domain/quality/mod.rs

pub mod assessor;
pub mod clinical_domain;
pub mod outcome;
pub mod record;
pub mod reference;
pub mod registry;
pub mod rule;
pub mod severity;
pub mod validator;

// Re-exports
pub use assessor::{BatchAssessor, QualityReport, RuleSummary, ValidationStatus};
pub use clinical_domain::ClinicalDomain;
pub use outcome::RuleOutcome;
pub use record::{FieldValue, Record, RecordIdentifier};
pub use reference::ReferenceSets;
pub use registry::RuleRegistry;
pub use rule::{Check, Rule, RuleDefinition};
pub use severity::Severity;
pub use validator::{BatchScope, NoReferences, RecordValidator};

// trialgate-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::ports::audit::AuditError;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Unknown clinical domain: '{0}'")]
    #[diagnostic(
        code(trialgate::domain::unknown_domain),
        help("Supported domains: DM (demographics), AE (adverse_event), VS (vital_sign), LB (lab_result).")
    )]
    UnknownDomain(String),

    #[error("Invalid definition for rule '{rule_id}': {reason}")]
    #[diagnostic(
        code(trialgate::domain::invalid_rule),
        help("Check the rule parameters in your rule file (min/max, values, reference_field).")
    )]
    InvalidRuleDefinition { rule_id: String, reason: String },

    #[error("Rule '{rule_id}' is already registered for domain {domain}")]
    #[diagnostic(
        code(trialgate::domain::duplicate_rule),
        help("Rule ids must be unique per domain. Disable `builtin-rules` to redefine a catalog rule.")
    )]
    DuplicateRule { domain: String, rule_id: String },

    #[error("Reference set '{set}' required by rule '{rule_id}' was not supplied")]
    #[diagnostic(
        code(trialgate::domain::missing_reference_set),
        help("Pass the reference values (e.g. subject ids from DM) for every REFERENTIAL rule.")
    )]
    MissingReferenceSet { rule_id: String, set: String },

    #[error("Layer '{0}' cannot be the source of a promotion")]
    #[diagnostic(
        code(trialgate::domain::invalid_source_layer),
        help("Batches enter the gate from bronze, silver or gold. Quarantined data is released by review only.")
    )]
    InvalidSourceLayer(String),

    #[error("Audit append failed for batch '{batch_id}': {source}")]
    #[diagnostic(
        code(trialgate::domain::audit),
        help("No decision is returned without a durable audit record. Check the audit log location.")
    )]
    AuditAppend {
        batch_id: String,
        #[source]
        source: AuditError,
    },
}

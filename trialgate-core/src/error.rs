// trialgate-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum TrialGateError {
    // --- DOMAIN ERRORS (rules, assessment, gate) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, parsing, config) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    #[diagnostic(
        code(trialgate::unsafe_path),
        help("Batch ids may only contain letters, digits, '.', '_' and '-'.")
    )]
    UnsafePath(String),

    #[error("Batch '{batch_id}' is listed twice for domain {domain}")]
    #[diagnostic(
        code(trialgate::duplicate_batch),
        help("Each batch is written to <target>/<layer>/<domain>/<batch_id>.json: give every batch its own id.")
    )]
    DuplicateBatch { domain: String, batch_id: String },
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for TrialGateError {
    fn from(err: std::io::Error) -> Self {
        TrialGateError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl TrialGateError {
    /// Failures that leave the audit trail in doubt.
    pub fn is_audit_failure(&self) -> bool {
        matches!(self, Self::Domain(DomainError::AuditAppend { .. }))
    }
}

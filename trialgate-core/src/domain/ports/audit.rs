// trialgate-core/src/domain/ports/audit.rs
//
// The audit/lineage log is the durable record of every promotion decision.
// Implementations must have persisted the entry when `append` returns Ok.

use thiserror::Error;

use crate::domain::promotion::PromotionDecision;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit entry could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}

pub trait AuditSink: Send + Sync {
    /// Appends one decision (with its full report). Append-only, at-least-once.
    fn append(&self, decision: &PromotionDecision) -> Result<(), AuditError>;
}

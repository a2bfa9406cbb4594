// trialgate-core/src/ports/sink.rs

// Where assessed batches go once the gate has decided. The gate itself never
// moves data: the application hands the records to a sink afterwards.

use crate::domain::promotion::{DataLayer, PromotionDecision};
use crate::domain::quality::{ClinicalDomain, Record};
use crate::error::TrialGateError;
use async_trait::async_trait;

#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Where `deliver` would store this batch, if known up front. Recorded as lineage
    /// in the audit trail, which is written before any delivery.
    fn locate(&self, _layer: DataLayer, _domain: ClinicalDomain, _batch_id: &str) -> Option<String> {
        None
    }

    /// Stores the batch in `decision.target_layer` and returns its location.
    async fn deliver(
        &self,
        decision: &PromotionDecision,
        records: &[Record],
    ) -> Result<String, TrialGateError>;
}

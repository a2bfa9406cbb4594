// trialgate-core/src/domain/promotion/gate.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::layer::DataLayer;
use super::policy::{Decision, PromotionPolicy};
use crate::domain::error::DomainError;
use crate::domain::ports::AuditSink;
use crate::domain::quality::{ClinicalDomain, QualityReport};

/// Input and output assets of one batch, as recorded in the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLineage {
    /// Where the records were read from.
    pub source: Option<String>,
    /// Where the verdict sends them.
    pub destination: Option<String>,
    pub record_count: usize,
}

/// Known locations of a batch before the verdict: its source and where each outcome would put it.
#[derive(Debug, Clone, Default)]
pub struct BatchRoutes {
    pub source: Option<String>,
    pub on_promote: Option<String>,
    pub on_quarantine: Option<String>,
}

/// One gate verdict, exactly as it is written to the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub domain: ClinicalDomain,
    pub batch_id: String,
    pub decision: Decision,
    pub reason: String,
    pub source_layer: DataLayer,
    pub target_layer: DataLayer,
    pub decided_at: DateTime<Utc>,
    #[serde(default)]
    pub lineage: BatchLineage,
    pub report: QualityReport,
}

impl PromotionDecision {
    pub fn is_promoted(&self) -> bool {
        self.decision == Decision::Promote
    }
}

pub struct PromotionGate<'a> {
    audit: &'a dyn AuditSink,
    source_layer: DataLayer,
    routes: BatchRoutes,
}

impl<'a> PromotionGate<'a> {
    pub fn new(audit: &'a dyn AuditSink) -> Self {
        Self {
            audit,
            source_layer: DataLayer::default(),
            routes: BatchRoutes::default(),
        }
    }

    /// Quarantine is refused: a PROMOTE verdict from it would land back in quarantine.
    pub fn with_source_layer(mut self, layer: DataLayer) -> Result<Self, DomainError> {
        if layer == DataLayer::Quarantine {
            return Err(DomainError::InvalidSourceLayer(layer.to_string()));
        }
        self.source_layer = layer;
        Ok(self)
    }

    pub fn with_routes(mut self, routes: BatchRoutes) -> Self {
        self.routes = routes;
        self
    }

    /// Evaluates `report` against `policy` and records the verdict.
    ///
    /// The decision is returned only once the audit sink has accepted it:
    /// an audit failure aborts the call and nothing may be promoted.
    pub fn decide(
        &self,
        batch_id: &str,
        report: QualityReport,
        policy: &PromotionPolicy,
    ) -> Result<PromotionDecision, DomainError> {
        let (decision, reason) = policy.evaluate(&report);

        let (target_layer, destination) = match decision {
            Decision::Promote => (self.source_layer.promotion_target(), &self.routes.on_promote),
            Decision::Quarantine => (DataLayer::Quarantine, &self.routes.on_quarantine),
        };
        let lineage = BatchLineage {
            source: self.routes.source.clone(),
            destination: destination.clone(),
            record_count: report.total_records,
        };

        let record = PromotionDecision {
            domain: report.domain,
            batch_id: batch_id.to_string(),
            decision,
            reason,
            source_layer: self.source_layer,
            target_layer,
            decided_at: Utc::now(),
            lineage,
            report,
        };

        self.audit
            .append(&record)
            .map_err(|source| DomainError::AuditAppend {
                batch_id: batch_id.to_string(),
                source,
            })?;

        match record.decision {
            Decision::Promote => info!(
                domain = %record.domain,
                batch_id,
                target = %record.target_layer,
                "Batch promoted: {}",
                record.reason
            ),
            Decision::Quarantine => warn!(
                domain = %record.domain,
                batch_id,
                "Batch quarantined: {}",
                record.reason
            ),
        }

        Ok(record)
    }
}

// trialgate-core/src/infrastructure/sink.rs

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

use crate::domain::promotion::{DataLayer, Decision, PromotionDecision};
use crate::domain::quality::{ClinicalDomain, QualityReport, Record};
use crate::error::TrialGateError;
use crate::infrastructure::fs::atomic_write;
use crate::ports::BatchSink;

fn re_batch_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap_or_else(|_| {
            // Hardcoded pattern; the fallback matches nothing
            Regex::new("$^").unwrap_or_else(|_| unreachable!())
        })
    })
}

/// Batch ids become file names: anything that could escape the target directory is refused.
pub fn validate_batch_id(batch_id: &str) -> Result<(), TrialGateError> {
    if re_batch_id().is_match(batch_id) && !batch_id.contains("..") {
        Ok(())
    } else {
        Err(TrialGateError::UnsafePath(batch_id.to_string()))
    }
}

#[derive(Serialize)]
struct BatchFile<'a> {
    batch_id: &'a str,
    domain: ClinicalDomain,
    layer: DataLayer,
    decision: Decision,
    reason: &'a str,
    records: &'a [Record],
    report: &'a QualityReport,
}

/// Writes batches to `<root>/<layer>/<domain>/<batch_id>.json`.
#[derive(Debug, Clone)]
pub struct FsBatchSink {
    root: PathBuf,
}

impl FsBatchSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn batch_path(
        &self,
        layer: DataLayer,
        domain: ClinicalDomain,
        batch_id: &str,
    ) -> Result<PathBuf, TrialGateError> {
        validate_batch_id(batch_id)?;
        Ok(self
            .root
            .join(layer.as_str())
            .join(domain.code())
            .join(format!("{}.json", batch_id)))
    }
}

#[async_trait]
impl BatchSink for FsBatchSink {
    fn locate(&self, layer: DataLayer, domain: ClinicalDomain, batch_id: &str) -> Option<String> {
        self.batch_path(layer, domain, batch_id)
            .ok()
            .map(|path| path.display().to_string())
    }

    async fn deliver(
        &self,
        decision: &PromotionDecision,
        records: &[Record],
    ) -> Result<String, TrialGateError> {
        let path = self.batch_path(decision.target_layer, decision.domain, &decision.batch_id)?;

        let payload = serde_json::to_vec_pretty(&BatchFile {
            batch_id: &decision.batch_id,
            domain: decision.domain,
            layer: decision.target_layer,
            decision: decision.decision,
            reason: &decision.reason,
            records,
            report: &decision.report,
        })
        .map_err(|e| TrialGateError::InternalError(format!("Batch serialization failed: {}", e)))?;

        let target = path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&target, payload))
            .await
            .map_err(|e| TrialGateError::InternalError(format!("Write task failed: {}", e)))??;

        info!(path = ?path, layer = %decision.target_layer, "Batch delivered");
        Ok(path.display().to_string())
    }
}

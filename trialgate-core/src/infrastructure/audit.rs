// trialgate-core/src/infrastructure/audit.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::domain::ports::{AuditError, AuditSink};
use crate::domain::promotion::PromotionDecision;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::append_line;

/// Append-only JSON-lines audit trail. One decision per line, synced before `append` returns.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    // Serializes appends from the batches of one process
    lock: Mutex<()>,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, decision: &PromotionDecision) -> Result<(), AuditError> {
        let line = serde_json::to_string(decision)?;
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AuditError::Unavailable("audit log lock poisoned".into()))?;
        append_line(&self.path, &line)?;
        debug!(path = ?self.path, batch_id = %decision.batch_id, "Audit entry appended");
        Ok(())
    }
}

/// In-process audit trail, for tests and embedding callers.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<PromotionDecision>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<PromotionDecision> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditLog {
    fn append(&self, decision: &PromotionDecision) -> Result<(), AuditError> {
        self.entries
            .lock()
            .map_err(|_| AuditError::Unavailable("in-memory audit log poisoned".into()))?
            .push(decision.clone());
        Ok(())
    }
}

/// Reads the audit trail back, oldest first. A missing file is an empty trail.
pub fn read_audit_log(path: &Path) -> Result<Vec<PromotionDecision>, InfrastructureError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(InfrastructureError::from))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::promotion::{Decision, PromotionGate, PromotionPolicy};
    use crate::domain::quality::{BatchAssessor, ClinicalDomain, NoReferences, Record, RuleRegistry};
    use crate::domain::quality::{Check, Rule, Severity};
    use anyhow::Result;
    use tempfile::tempdir;

    fn dm_registry() -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        registry
            .add(Rule::new(
                "DM_002",
                ClinicalDomain::Demographics,
                "USUBJID",
                Check::NotNull,
                Severity::Error,
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_jsonl_log_round_trips_decisions() -> Result<()> {
        let dir = tempdir()?;
        let log = JsonlAuditLog::new(dir.path().join("audit").join("decisions.jsonl"));
        let registry = dm_registry();
        let assessor = BatchAssessor::new(&registry);
        let gate = PromotionGate::new(&log);

        let good = vec![Record::new().with("USUBJID", "S1")];
        let bad = vec![Record::new().with("AGE", 30)];
        for (batch_id, records) in [("dm-1", &good), ("dm-2", &bad)] {
            let report = assessor.assess(ClinicalDomain::Demographics, records, &NoReferences)?;
            gate.decide(batch_id, report, &PromotionPolicy::default())?;
        }

        let entries = read_audit_log(log.path())?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].batch_id, "dm-1");
        assert_eq!(entries[0].decision, Decision::Promote);
        assert_eq!(entries[1].decision, Decision::Quarantine);
        assert_eq!(entries[1].report.error_failures, 1);
        assert_eq!(entries[1].report.outcomes.len(), 1);
        Ok(())
    }

    #[test]
    fn test_unwritable_log_fails_decision() -> Result<()> {
        let dir = tempdir()?;
        // A directory where the file should be
        let path = dir.path().join("decisions.jsonl");
        fs::create_dir_all(&path)?;
        let log = JsonlAuditLog::new(&path);

        let registry = dm_registry();
        let report = BatchAssessor::new(&registry).assess(
            ClinicalDomain::Demographics,
            Vec::<Record>::new(),
            &NoReferences,
        )?;
        let result = PromotionGate::new(&log).decide("dm-3", report, &PromotionPolicy::default());
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_missing_log_reads_empty() -> Result<()> {
        let dir = tempdir()?;
        assert!(read_audit_log(&dir.path().join("none.jsonl"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_in_memory_log() -> Result<()> {
        let log = InMemoryAuditLog::new();
        let registry = dm_registry();
        let report = BatchAssessor::new(&registry).assess(
            ClinicalDomain::Demographics,
            vec![Record::new().with("USUBJID", "S1")],
            &NoReferences,
        )?;
        PromotionGate::new(&log).decide("dm-4", report, &PromotionPolicy::default())?;
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].batch_id, "dm-4");
        Ok(())
    }
}

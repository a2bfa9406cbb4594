// trialgate-core/src/domain/promotion/summary.rs
//
// Cross-domain quality KPIs computed from the audit trail. Every audited
// decision counts, re-runs of a batch included.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::gate::PromotionDecision;
use super::policy::Decision;
use crate::domain::quality::ClinicalDomain;
use crate::domain::quality::assessor::round_to;

// Record pass-rate thresholds (percent) for the overall health status
const HEALTHY_PASS_RATE: f64 = 98.0;
const WARNING_PASS_RATE: f64 = 95.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub batches: usize,
    pub promoted: usize,
    pub quarantined: usize,
    pub records: usize,
    /// Records with no failing outcome of any severity.
    pub records_passed: usize,
    /// Records of quarantined batches.
    pub records_quarantined: usize,
}

impl SummaryCounts {
    fn add(&mut self, decision: &PromotionDecision) {
        self.batches += 1;
        self.records += decision.report.total_records;
        self.records_passed += decision.report.passed;
        match decision.decision {
            Decision::Promote => self.promoted += 1,
            Decision::Quarantine => {
                self.quarantined += 1;
                self.records_quarantined += decision.report.total_records;
            }
        }
    }

    fn merge(&mut self, other: &SummaryCounts) {
        self.batches += other.batches;
        self.promoted += other.promoted;
        self.quarantined += other.quarantined;
        self.records += other.records;
        self.records_passed += other.records_passed;
        self.records_quarantined += other.records_quarantined;
    }

    /// Share of records that passed every rule, one decimal. 100.0 when no record was seen.
    pub fn pass_rate_pct(&self) -> f64 {
        if self.records == 0 {
            return 100.0;
        }
        round_to(100.0 * self.records_passed as f64 / self.records as f64, 1)
    }

    pub fn quarantine_rate_pct(&self) -> f64 {
        if self.records == 0 {
            return 0.0;
        }
        round_to(100.0 * self.records_quarantined as f64 / self.records as f64, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSummary {
    pub domain: ClinicalDomain,
    #[serde(flatten)]
    pub counts: SummaryCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    /// One entry per domain seen in the trail, in domain order.
    pub domains: Vec<DomainSummary>,
    pub overall: SummaryCounts,
}

impl QualitySummary {
    pub fn from_decisions(decisions: &[PromotionDecision]) -> Self {
        let mut per_domain: BTreeMap<ClinicalDomain, SummaryCounts> = BTreeMap::new();
        for decision in decisions {
            per_domain.entry(decision.domain).or_default().add(decision);
        }

        let mut overall = SummaryCounts::default();
        for counts in per_domain.values() {
            overall.merge(counts);
        }

        Self {
            domains: per_domain
                .into_iter()
                .map(|(domain, counts)| DomainSummary { domain, counts })
                .collect(),
            overall,
        }
    }

    pub fn status(&self) -> HealthStatus {
        let rate = self.overall.pass_rate_pct();
        if rate >= HEALTHY_PASS_RATE {
            HealthStatus::Healthy
        } else if rate >= WARNING_PASS_RATE {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::ports::{AuditError, AuditSink};
    use crate::domain::promotion::policy::tests::report;
    use crate::domain::promotion::{PromotionGate, PromotionPolicy};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Trail(Mutex<Vec<PromotionDecision>>);

    impl AuditSink for Trail {
        fn append(&self, decision: &PromotionDecision) -> Result<(), AuditError> {
            self.0.lock().unwrap().push(decision.clone());
            Ok(())
        }
    }

    fn decide(trail: &Trail, domain: ClinicalDomain, errors: usize) -> anyhow::Result<()> {
        let mut batch = report(errors, 0);
        batch.domain = domain;
        PromotionGate::new(trail).decide("b", batch, &PromotionPolicy::default())?;
        Ok(())
    }

    #[test]
    fn test_empty_trail_is_healthy() {
        let summary = QualitySummary::from_decisions(&[]);
        assert!(summary.domains.is_empty());
        assert_eq!(summary.overall.pass_rate_pct(), 100.0);
        assert_eq!(summary.status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_counts_per_domain_and_overall() -> anyhow::Result<()> {
        let trail = Trail::default();
        decide(&trail, ClinicalDomain::AdverseEvent, 0)?;
        decide(&trail, ClinicalDomain::AdverseEvent, 3)?;
        decide(&trail, ClinicalDomain::Demographics, 0)?;

        let summary = QualitySummary::from_decisions(&trail.0.lock().unwrap());

        // Domain order, not trail order
        assert_eq!(summary.domains[0].domain, ClinicalDomain::Demographics);
        let ae = &summary.domains[1].counts;
        assert_eq!((ae.batches, ae.promoted, ae.quarantined), (2, 1, 1));
        assert_eq!(ae.records, 20);
        assert_eq!(ae.records_passed, 17);
        assert_eq!(ae.pass_rate_pct(), 85.0);
        assert_eq!(ae.quarantine_rate_pct(), 50.0);

        assert_eq!(summary.overall.batches, 3);
        assert_eq!(summary.overall.records, 30);
        assert_eq!(summary.overall.pass_rate_pct(), 90.0);
        assert_eq!(summary.status(), HealthStatus::Critical);
        Ok(())
    }

    #[test]
    fn test_status_thresholds() {
        let with_rate = |passed| QualitySummary {
            domains: Vec::new(),
            overall: SummaryCounts {
                records: 1000,
                records_passed: passed,
                ..SummaryCounts::default()
            },
        };
        assert_eq!(with_rate(980).status(), HealthStatus::Healthy);
        assert_eq!(with_rate(950).status(), HealthStatus::Warning);
        assert_eq!(with_rate(949).status(), HealthStatus::Critical);
    }
}

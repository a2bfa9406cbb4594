// trialgate-core/src/domain/quality/assessor.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tracing::{debug, instrument};

use super::clinical_domain::ClinicalDomain;
use super::outcome::RuleOutcome;
use super::record::Record;
use super::registry::RuleRegistry;
use super::rule::{Check, Rule};
use super::severity::Severity;
use super::validator::{BatchScope, RecordValidator};
use crate::domain::error::DomainError;
use crate::domain::ports::ReferenceSetProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Passed,
    PassedWithWarnings,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::PassedWithWarnings => "PASSED_WITH_WARNINGS",
            Self::Failed => "FAILED",
        }
    }
}

/// Failure count of one rule over the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub rule_id: String,
    pub check: String,
    pub target_field: String,
    pub severity: Severity,
    pub failures: usize,
    pub failure_pct: f64,
}

/// Aggregate quality of one batch for one domain. Only failing outcomes are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub domain: ClinicalDomain,
    pub total_records: usize,
    pub error_failures: usize,
    pub warning_failures: usize,
    /// Records without any failing outcome.
    pub passed: usize,
    pub records_with_errors: usize,
    /// Share of records with zero ERROR failures, one decimal. 100.0 for an empty batch.
    pub completeness_pct: f64,
    pub zero_records: bool,
    pub status: ValidationStatus,
    pub rule_summaries: Vec<RuleSummary>,
    pub outcomes: Vec<RuleOutcome>,
    pub assessed_at: DateTime<Utc>,
}

impl QualityReport {
    pub fn failures(&self) -> usize {
        self.error_failures + self.warning_failures
    }
}

pub struct BatchAssessor<'r> {
    registry: &'r RuleRegistry,
}

impl<'r> BatchAssessor<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self { registry }
    }

    /// Validates every record of the batch against the domain's rules.
    ///
    /// Records are visited in input order, which decides which duplicate a
    /// UNIQUENESS rule flags: the first occurrence passes, later ones fail.
    /// Fails fast only on configuration problems (unknown domain, missing
    /// reference set); bad data always ends up in the report.
    #[instrument(skip_all, fields(domain = %domain))]
    pub fn assess<I>(
        &self,
        domain: ClinicalDomain,
        records: I,
        references: &dyn ReferenceSetProvider,
    ) -> Result<QualityReport, DomainError>
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        let rules = self.registry.load(domain)?;
        ensure_reference_sets(rules, references)?;

        let mut scope = BatchScope::new(references);
        let mut failures_per_rule = vec![0usize; rules.len()];
        let mut outcomes = Vec::new();
        let mut total_records = 0usize;
        let mut error_failures = 0usize;
        let mut warning_failures = 0usize;
        let mut passed = 0usize;
        let mut records_with_errors = 0usize;

        for (row, record) in records.into_iter().enumerate() {
            let record: &Record = record.borrow();
            total_records += 1;
            let mut record_errors = 0usize;
            let mut record_failures = 0usize;

            for (idx, rule) in rules.iter().enumerate() {
                let outcome = RecordValidator::validate(record, row, rule, &mut scope);
                if outcome.passed {
                    continue;
                }
                failures_per_rule[idx] += 1;
                record_failures += 1;
                match outcome.severity {
                    Severity::Error => {
                        error_failures += 1;
                        record_errors += 1;
                    }
                    Severity::Warning => warning_failures += 1,
                }
                debug!(rule_id = %outcome.rule_id, record = %outcome.record, "Check failed");
                outcomes.push(outcome);
            }

            if record_failures == 0 {
                passed += 1;
            }
            if record_errors > 0 {
                records_with_errors += 1;
            }
        }

        let zero_records = total_records == 0;
        let completeness_pct = if zero_records {
            100.0
        } else {
            round_to(
                100.0 * (total_records - records_with_errors) as f64 / total_records as f64,
                1,
            )
        };

        let status = if error_failures > 0 {
            ValidationStatus::Failed
        } else if warning_failures > 0 {
            ValidationStatus::PassedWithWarnings
        } else {
            ValidationStatus::Passed
        };

        let rule_summaries = rules
            .iter()
            .zip(failures_per_rule)
            .map(|(rule, failures)| RuleSummary {
                rule_id: rule.rule_id.clone(),
                check: rule.check.name().to_string(),
                target_field: rule.target_field.clone(),
                severity: rule.severity,
                failures,
                failure_pct: if zero_records {
                    0.0
                } else {
                    round_to(100.0 * failures as f64 / total_records as f64, 2)
                },
            })
            .collect();

        Ok(QualityReport {
            domain,
            total_records,
            error_failures,
            warning_failures,
            passed,
            records_with_errors,
            completeness_pct,
            zero_records,
            status,
            rule_summaries,
            outcomes,
            assessed_at: Utc::now(),
        })
    }
}

fn ensure_reference_sets(
    rules: &[Rule],
    references: &dyn ReferenceSetProvider,
) -> Result<(), DomainError> {
    for rule in rules {
        if let Check::Referential { reference_set } = &rule.check
            && references.values(reference_set).is_none()
        {
            return Err(DomainError::MissingReferenceSet {
                rule_id: rule.rule_id.clone(),
                set: reference_set.clone(),
            });
        }
    }
    Ok(())
}

/// Rounds half away from zero.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::quality::{FieldValue, ReferenceSets, validator::NoReferences};
    use std::collections::BTreeSet;

    fn demographics_registry() -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        let dm = ClinicalDomain::Demographics;
        registry
            .add(Rule::new("DM_002", dm, "USUBJID", Check::NotNull, Severity::Error))
            .unwrap();
        registry
            .add(Rule::new(
                "DM_003",
                dm,
                "AGE",
                Check::Range { min: 0.0, max: 120.0 },
                Severity::Error,
            ))
            .unwrap();
        let sexes: BTreeSet<String> = ["M", "F", "U"].iter().map(|s| s.to_string()).collect();
        registry
            .add(Rule::new(
                "DM_004",
                dm,
                "SEX",
                Check::AllowedValues { values: sexes },
                Severity::Error,
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_demographics_scenario() -> anyhow::Result<()> {
        let registry = demographics_registry();
        let records = vec![
            Record::new().with("USUBJID", "S1").with("AGE", 45).with("SEX", "M"),
            Record::new().with("USUBJID", "S2").with("AGE", 150).with("SEX", "F"),
            Record::new()
                .with("USUBJID", FieldValue::Null)
                .with("AGE", 30)
                .with("SEX", "X"),
        ];

        let report = BatchAssessor::new(&registry).assess(
            ClinicalDomain::Demographics,
            &records,
            &NoReferences,
        )?;

        assert_eq!(report.total_records, 3);
        assert_eq!(report.error_failures, 3);
        assert_eq!(report.warning_failures, 0);
        assert_eq!(report.passed, 1);
        assert_eq!(report.records_with_errors, 2);
        assert_eq!(report.completeness_pct, 33.3);
        assert_eq!(report.status, ValidationStatus::Failed);

        let failed: Vec<(&str, usize)> = report
            .outcomes
            .iter()
            .map(|o| (o.rule_id.as_str(), o.record.row))
            .collect();
        assert_eq!(failed, vec![("DM_003", 1), ("DM_002", 2), ("DM_004", 2)]);
        assert!(report.outcomes.iter().all(|o| !o.passed));
        Ok(())
    }

    #[test]
    fn test_empty_batch() -> anyhow::Result<()> {
        let registry = demographics_registry();
        let report = BatchAssessor::new(&registry).assess(
            ClinicalDomain::Demographics,
            Vec::<Record>::new(),
            &NoReferences,
        )?;
        assert_eq!(report.total_records, 0);
        assert_eq!(report.completeness_pct, 100.0);
        assert!(report.zero_records);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.status, ValidationStatus::Passed);
        Ok(())
    }

    #[test]
    fn test_uniqueness_flags_only_later_duplicates() -> anyhow::Result<()> {
        let mut registry = RuleRegistry::new();
        registry.add(Rule::new(
            "DM_001",
            ClinicalDomain::Demographics,
            "USUBJID",
            Check::Uniqueness,
            Severity::Error,
        ))?;
        let records = vec![
            Record::new().with("USUBJID", "A"),
            Record::new().with("USUBJID", "A"),
            Record::new().with("USUBJID", "B"),
        ];

        let report = BatchAssessor::new(&registry).assess(
            ClinicalDomain::Demographics,
            records.iter(),
            &NoReferences,
        )?;
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].record.row, 1);
        Ok(())
    }

    #[test]
    fn test_seen_values_do_not_leak_between_batches() -> anyhow::Result<()> {
        let mut registry = RuleRegistry::new();
        registry.add(Rule::new(
            "DM_001",
            ClinicalDomain::Demographics,
            "USUBJID",
            Check::Uniqueness,
            Severity::Error,
        ))?;
        let assessor = BatchAssessor::new(&registry);
        let batch = vec![Record::new().with("USUBJID", "A")];

        let first = assessor.assess(ClinicalDomain::Demographics, &batch, &NoReferences)?;
        let second = assessor.assess(ClinicalDomain::Demographics, &batch, &NoReferences)?;
        assert_eq!(first.error_failures, 0);
        assert_eq!(second.error_failures, 0);
        Ok(())
    }

    #[test]
    fn test_warnings_do_not_reduce_completeness() -> anyhow::Result<()> {
        let mut registry = RuleRegistry::new();
        registry.add(Rule::new(
            "DM_005",
            ClinicalDomain::Demographics,
            "ARM",
            Check::NotNull,
            Severity::Warning,
        ))?;
        let records = vec![Record::new().with("USUBJID", "S1")];
        let report = BatchAssessor::new(&registry).assess(
            ClinicalDomain::Demographics,
            &records,
            &NoReferences,
        )?;
        assert_eq!(report.warning_failures, 1);
        assert_eq!(report.completeness_pct, 100.0);
        assert_eq!(report.passed, 0);
        assert_eq!(report.status, ValidationStatus::PassedWithWarnings);
        assert_eq!(report.rule_summaries[0].failure_pct, 100.0);
        Ok(())
    }

    #[test]
    fn test_missing_reference_set_fails_fast() -> anyhow::Result<()> {
        let mut registry = RuleRegistry::new();
        registry.add(Rule::new(
            "AE_006",
            ClinicalDomain::AdverseEvent,
            "USUBJID",
            Check::Referential {
                reference_set: "USUBJID".into(),
            },
            Severity::Error,
        ))?;
        let records = vec![Record::new().with("USUBJID", "S1")];
        let assessor = BatchAssessor::new(&registry);

        let err = assessor
            .assess(ClinicalDomain::AdverseEvent, &records, &NoReferences)
            .unwrap_err();
        assert!(matches!(err, DomainError::MissingReferenceSet { .. }));

        let refs = ReferenceSets::new().with_set("USUBJID", ["S1"]);
        let report = assessor.assess(ClinicalDomain::AdverseEvent, &records, &refs)?;
        assert_eq!(report.error_failures, 0);
        Ok(())
    }

    #[test]
    fn test_unknown_domain_aborts() {
        let registry = demographics_registry();
        let result = BatchAssessor::new(&registry).assess(
            ClinicalDomain::VitalSign,
            Vec::<Record>::new(),
            &NoReferences,
        );
        assert!(matches!(result, Err(DomainError::UnknownDomain(_))));
    }

    #[test]
    fn test_completeness_rounding() {
        assert_eq!(round_to(66.666, 1), 66.7);
        assert_eq!(round_to(0.05, 1), 0.1);
    }
}

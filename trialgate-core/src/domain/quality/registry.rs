// trialgate-core/src/domain/quality/registry.rs

use std::collections::HashMap;
use tracing::debug;

use super::clinical_domain::ClinicalDomain;
use super::rule::{Rule, RuleDefinition};
use crate::domain::error::DomainError;

/// Ordered rule sets per domain.
///
/// Built once at startup, then shared read-only (typically behind an `Arc`)
/// by every concurrent assessment. There is no mutation through `&self`.
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    rule_sets: HashMap<ClinicalDomain, Vec<Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a domain with an (initially) empty rule set.
    pub fn register_domain(&mut self, domain: ClinicalDomain) {
        self.rule_sets.entry(domain).or_default();
    }

    pub fn add(&mut self, rule: Rule) -> Result<(), DomainError> {
        rule.validate_definition()?;

        let rules = self.rule_sets.entry(rule.domain).or_default();
        if rules.iter().any(|r| r.rule_id == rule.rule_id) {
            return Err(DomainError::DuplicateRule {
                domain: rule.domain.to_string(),
                rule_id: rule.rule_id,
            });
        }

        debug!(domain = %rule.domain, rule_id = %rule.rule_id, check = %rule.check, "Rule registered");
        rules.push(rule);
        Ok(())
    }

    pub fn add_definition(
        &mut self,
        domain: ClinicalDomain,
        definition: &RuleDefinition,
    ) -> Result<(), DomainError> {
        self.add(definition.compile(domain)?)
    }

    /// Rules for `domain`, in registration order.
    pub fn load(&self, domain: ClinicalDomain) -> Result<&[Rule], DomainError> {
        self.rule_sets
            .get(&domain)
            .map(Vec::as_slice)
            .ok_or_else(|| DomainError::UnknownDomain(domain.to_string()))
    }

    /// Same as `load`, from a textual domain code.
    pub fn load_by_code(&self, code: &str) -> Result<&[Rule], DomainError> {
        self.load(code.parse()?)
    }

    pub fn domains(&self) -> Vec<ClinicalDomain> {
        let mut domains: Vec<ClinicalDomain> = self.rule_sets.keys().copied().collect();
        domains.sort();
        domains
    }

    pub fn rule_count(&self) -> usize {
        self.rule_sets.values().map(Vec::len).sum()
    }
}

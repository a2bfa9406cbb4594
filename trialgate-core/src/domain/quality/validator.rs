// trialgate-core/src/domain/quality/validator.rs

use std::collections::{HashMap, HashSet};

use super::outcome::RuleOutcome;
use super::record::{FieldValue, Record};
use super::rule::{Check, Rule};
use crate::domain::ports::ReferenceSetProvider;

/// Provider with no sets at all, for callers that validate without REFERENTIAL rules.
pub struct NoReferences;

impl ReferenceSetProvider for NoReferences {
    fn values(&self, _key: &str) -> Option<&HashSet<String>> {
        None
    }
}

/// Per-batch state: the values already seen by each UNIQUENESS rule and the caller's
/// reference sets. Allocated fresh for every assessment, never shared between batches.
pub struct BatchScope<'a> {
    seen: HashMap<String, HashSet<String>>,
    references: &'a dyn ReferenceSetProvider,
}

impl<'a> BatchScope<'a> {
    pub fn new(references: &'a dyn ReferenceSetProvider) -> Self {
        Self {
            seen: HashMap::new(),
            references,
        }
    }

    /// Returns `true` when the value was not seen before by this rule (first write wins).
    fn first_sighting(&mut self, rule_id: &str, value: String) -> bool {
        self.seen
            .entry(rule_id.to_string())
            .or_default()
            .insert(value)
    }
}

impl BatchScope<'static> {
    pub fn without_references() -> Self {
        Self::new(&NoReferences)
    }
}

pub struct RecordValidator;

impl RecordValidator {
    /// Applies one rule to one record. Data problems are reported as failing outcomes,
    /// never as errors. A missing target field makes every check except NOT_NULL vacuous.
    pub fn validate(record: &Record, row: usize, rule: &Rule, scope: &mut BatchScope<'_>) -> RuleOutcome {
        let id = record.identifier(rule.domain, row);
        let field = rule.target_field.as_str();
        let pass = |id| RuleOutcome::pass(&rule.rule_id, id, rule.severity);
        let fail = |id, msg: String| RuleOutcome::fail(&rule.rule_id, id, rule.severity, msg);

        let value = match (record.present(field), &rule.check) {
            (None, Check::NotNull) => return fail(id, format!("{} is null or empty", field)),
            (None, _) | (Some(_), Check::NotNull) => return pass(id),
            (Some(value), _) => value,
        };

        match &rule.check {
            Check::NotNull => pass(id),

            Check::Uniqueness => match value.canonical() {
                Some(key) if !scope.first_sighting(&rule.rule_id, key.clone()) => {
                    fail(id, format!("duplicate {} value '{}'", field, key))
                }
                _ => pass(id),
            },

            Check::Range { min, max } => match value.as_number() {
                Some(n) if n >= *min && n <= *max => pass(id),
                Some(n) if n.is_nan() => fail(id, format!("{} value is not a number", field)),
                Some(n) => fail(
                    id,
                    format!("{} value {} outside [{}, {}]", field, n, min, max),
                ),
                None => fail(
                    id,
                    format!("{} value '{}' is not numeric", field, display(value)),
                ),
            },

            Check::AllowedValues { values } => match value.canonical() {
                Some(v) if values.contains(&v) => pass(id),
                _ => {
                    let allowed: Vec<&str> = values.iter().map(String::as_str).collect();
                    fail(
                        id,
                        format!(
                            "{} value '{}' not in allowed set {{{}}}",
                            field,
                            display(value),
                            allowed.join(", ")
                        ),
                    )
                }
            },

            Check::CrossFieldDateOrder { reference_field } => {
                let target = value.as_date();
                let reference = record.present(reference_field).and_then(FieldValue::as_date);
                match (target, reference) {
                    (Some(t), Some(r)) if t < r => fail(
                        id,
                        format!("{} ({}) precedes {} ({})", field, t, reference_field, r),
                    ),
                    // Unparseable or missing dates are left to NOT_NULL/format rules.
                    _ => pass(id),
                }
            }

            Check::Referential { reference_set } => match scope.references.values(reference_set) {
                None => fail(
                    id,
                    format!("reference set '{}' not supplied", reference_set),
                ),
                Some(known) => match value.canonical() {
                    Some(v) if known.contains(&v) => pass(id),
                    _ => fail(
                        id,
                        format!(
                            "{} value '{}' not found in reference set '{}'",
                            field,
                            display(value),
                            reference_set
                        ),
                    ),
                },
            },
        }
    }
}

fn display(value: &FieldValue) -> String {
    value.canonical().unwrap_or_default()
}

// trialgate-core/src/domain/quality/rule.rs
//
// Rule files carry loosely-typed entries (a check name plus free parameters).
// They are compiled once into `Rule`, whose `Check` is a closed enum with typed
// parameters, so validation never dispatches on strings.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use validator::Validate;

use super::clinical_domain::ClinicalDomain;
use super::severity::Severity;
use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "check", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Check {
    NotNull,
    Uniqueness,
    Range {
        min: f64,
        max: f64,
    },
    AllowedValues {
        values: BTreeSet<String>,
    },
    CrossFieldDateOrder {
        reference_field: String,
    },
    Referential {
        reference_set: String,
    },
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotNull => "NOT_NULL",
            Self::Uniqueness => "UNIQUENESS",
            Self::Range { .. } => "RANGE",
            Self::AllowedValues { .. } => "ALLOWED_VALUES",
            Self::CrossFieldDateOrder { .. } => "CROSS_FIELD_DATE_ORDER",
            Self::Referential { .. } => "REFERENTIAL",
        }
    }

    /// Short rendering of the parameters, for listings.
    pub fn parameters(&self) -> String {
        match self {
            Self::NotNull | Self::Uniqueness => String::new(),
            Self::Range { min, max } => format!("[{}, {}]", min, max),
            Self::AllowedValues { values } => {
                let list: Vec<&str> = values.iter().map(String::as_str).collect();
                format!("{{{}}}", list.join(", "))
            }
            Self::CrossFieldDateOrder { reference_field } => format!(">= {}", reference_field),
            Self::Referential { reference_set } => format!("in <{}>", reference_set),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A compiled, immutable validation rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub rule_id: String,
    pub domain: ClinicalDomain,
    pub target_field: String,
    #[serde(flatten)]
    pub check: Check,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Rule {
    pub fn new(
        rule_id: impl Into<String>,
        domain: ClinicalDomain,
        target_field: impl Into<String>,
        check: Check,
        severity: Severity,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            domain,
            target_field: target_field.into(),
            check,
            severity,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Re-checks the invariants of a rule built in code rather than compiled from a definition.
    pub fn validate_definition(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidRuleDefinition {
            rule_id: self.rule_id.clone(),
            reason: reason.to_string(),
        };

        if self.rule_id.trim().is_empty() {
            return Err(invalid("rule id cannot be empty"));
        }
        if self.target_field.trim().is_empty() {
            return Err(invalid("target field cannot be empty"));
        }

        match &self.check {
            Check::Range { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(invalid("RANGE bounds must be finite numbers"));
                }
                if min > max {
                    return Err(invalid("RANGE min is greater than max"));
                }
            }
            Check::AllowedValues { values } if values.is_empty() => {
                return Err(invalid("ALLOWED_VALUES needs at least one value"));
            }
            Check::CrossFieldDateOrder { reference_field } => {
                if reference_field.trim().is_empty() {
                    return Err(invalid("CROSS_FIELD_DATE_ORDER needs a reference_field"));
                }
                if *reference_field == self.target_field {
                    return Err(invalid("reference_field must differ from the target field"));
                }
            }
            Check::Referential { reference_set } if reference_set.trim().is_empty() => {
                return Err(invalid("REFERENTIAL reference_set cannot be empty"));
            }
            _ => {}
        }
        Ok(())
    }
}

// --- CONFIGURATION ENTRY ---

/// One rule entry as written in a rule file.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RuleDefinition {
    #[validate(length(min = 1, message = "rule id cannot be empty"))]
    pub id: String,

    pub check: String,

    #[validate(length(min = 1, message = "target field cannot be empty"))]
    pub field: String,

    /// Parsed at compile time so a typo is reported against the rule, not the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub params: HashMap<String, serde_yaml::Value>,
}

impl RuleDefinition {
    /// Fails fast on unknown checks or malformed parameters.
    pub fn compile(&self, domain: ClinicalDomain) -> Result<Rule, DomainError> {
        let invalid = |reason: String| DomainError::InvalidRuleDefinition {
            rule_id: self.id.clone(),
            reason,
        };

        self.validate().map_err(|e| invalid(e.to_string()))?;

        let check = match self.check.trim().to_lowercase().replace('-', "_").as_str() {
            "not_null" => Check::NotNull,
            "uniqueness" | "unique" => Check::Uniqueness,
            "range" => Check::Range {
                min: self.number_param("min").map_err(invalid)?,
                max: self.number_param("max").map_err(invalid)?,
            },
            "allowed_values" => Check::AllowedValues {
                values: self.values_param().map_err(invalid)?,
            },
            "cross_field_date_order" => Check::CrossFieldDateOrder {
                reference_field: self
                    .string_param("reference_field")
                    .map_err(invalid)?
                    .ok_or_else(|| invalid("missing 'reference_field'".to_string()))?,
            },
            "referential" => Check::Referential {
                reference_set: self
                    .string_param("reference_set")
                    .map_err(invalid)?
                    .unwrap_or_else(|| self.field.clone()),
            },
            other => return Err(invalid(format!("unknown check type '{}'", other))),
        };

        let severity = match self.severity.as_deref() {
            Some(raw) => raw.trim().parse::<Severity>().map_err(invalid)?,
            None => Severity::default(),
        };

        let rule = Rule {
            rule_id: self.id.clone(),
            domain,
            target_field: self.field.clone(),
            check,
            severity,
            description: self.description.clone(),
        };
        rule.validate_definition()?;
        Ok(rule)
    }

    fn number_param(&self, key: &str) -> Result<f64, String> {
        match self.params.get(key) {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| format!("'{}' must be a number", key)),
            None => Err(format!("missing '{}'", key)),
        }
    }

    fn string_param(&self, key: &str) -> Result<Option<String>, String> {
        match self.params.get(key) {
            None => Ok(None),
            Some(serde_yaml::Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(format!("'{}' must be a string", key)),
        }
    }

    fn values_param(&self) -> Result<BTreeSet<String>, String> {
        let seq = match self.params.get("values") {
            Some(serde_yaml::Value::Sequence(seq)) => seq,
            Some(_) => return Err("'values' must be a list".to_string()),
            None => return Err("missing 'values'".to_string()),
        };

        seq.iter()
            .map(|v| match v {
                serde_yaml::Value::String(s) => Ok(s.clone()),
                serde_yaml::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Ok(i.to_string())
                    } else if let Some(u) = n.as_u64() {
                        Ok(u.to_string())
                    } else {
                        n.as_f64()
                            .filter(|f| f.is_finite())
                            .map(|f| f.to_string())
                            .ok_or_else(|| "invalid number in 'values'".to_string())
                    }
                }
                serde_yaml::Value::Bool(b) => Ok(b.to_string()),
                _ => Err("'values' entries must be scalars".to_string()),
            })
            .collect()
    }
}

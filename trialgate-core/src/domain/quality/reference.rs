// trialgate-core/src/domain/quality/reference.rs

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};

use super::record::{FieldValue, Record};
use crate::domain::ports::ReferenceSetProvider;

/// Known-valid values for REFERENTIAL checks, keyed by set name (usually a field name).
/// Supplied by the caller per batch; the validator only reads it.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSets {
    sets: HashMap<String, HashSet<String>>,
}

impl ReferenceSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend(key, values);
        self
    }

    pub fn extend<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Collects the present values of `field` across `records` into the set `key`.
    pub fn collect_field<I>(&mut self, key: &str, field: &str, records: I)
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        let values: Vec<String> = records
            .into_iter()
            .filter_map(|r| {
                let record: &Record = r.borrow();
                record.present(field).and_then(FieldValue::canonical)
            })
            .collect();
        self.extend(key, values);
    }

    pub fn merge(&mut self, other: ReferenceSets) {
        for (key, values) in other.sets {
            self.extend(key, values);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }
}

impl ReferenceSetProvider for ReferenceSets {
    fn values(&self, key: &str) -> Option<&HashSet<String>> {
        self.sets.get(key)
    }
}

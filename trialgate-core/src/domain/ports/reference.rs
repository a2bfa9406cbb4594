use std::collections::HashSet;

/// Supplies known-valid values for REFERENTIAL checks, keyed by set name.
pub trait ReferenceSetProvider: Send + Sync {
    fn values(&self, key: &str) -> Option<&HashSet<String>>;
}

// trialgate-core/src/infrastructure/mod.rs

pub mod audit;
pub mod config;
pub mod error;
pub mod fs;
pub mod records;
pub mod sink;

pub use audit::{InMemoryAuditLog, JsonlAuditLog, read_audit_log};
pub use config::{ProjectConfig, build_registry, load_project_config, load_project_config_or_default};
pub use records::read_records;
pub use sink::{FsBatchSink, validate_batch_id};

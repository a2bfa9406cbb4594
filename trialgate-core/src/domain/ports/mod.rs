// src/domain/ports/mod.rs

pub mod audit;
pub mod reference;

pub use audit::{AuditError, AuditSink};
pub use reference::ReferenceSetProvider;

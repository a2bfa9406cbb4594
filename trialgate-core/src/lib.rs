// trialgate-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (async interfaces towards storage)
pub mod ports;

// 2. Domain (rules, validation, quality assessment, promotion gate)
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (config files, rule files, record readers, audit log, batch sink)
// Depends on Domain and Ports.
pub mod infrastructure;

// 4. Application (use cases)
// Batch processing orchestration. Depends on Domain, Infra and Ports.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::TrialGateError;

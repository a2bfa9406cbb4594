// trialgate-core/src/application/mod.rs

pub mod pipeline;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI can `use trialgate_core::application::{process_batch, run_batches, PipelineContext};`
pub use pipeline::{BatchInput, BatchOutcome, PipelineContext, process_batch, run_batches};

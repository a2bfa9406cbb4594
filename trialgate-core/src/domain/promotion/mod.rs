// trialgate-core/src/domain/promotion/mod.rs

pub mod gate;
pub mod layer;
pub mod policy;
pub mod summary;

pub use gate::{BatchLineage, BatchRoutes, PromotionDecision, PromotionGate};
pub use layer::DataLayer;
pub use policy::{Decision, PromotionPolicy};
pub use summary::{DomainSummary, HealthStatus, QualitySummary, SummaryCounts};

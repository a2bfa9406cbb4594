// trialgate-core/src/application/pipeline.rs

use futures::StreamExt;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::error::TrialGateError;
use crate::ports::BatchSink;

// Domain
use crate::domain::ports::{AuditSink, ReferenceSetProvider};
use crate::domain::promotion::{
    BatchRoutes, DataLayer, Decision, PromotionDecision, PromotionGate, PromotionPolicy,
};
use crate::domain::quality::{BatchAssessor, ClinicalDomain, Record, ReferenceSets, RuleRegistry};

// Infrastructure
use crate::infrastructure::audit::JsonlAuditLog;
use crate::infrastructure::config::{ProjectConfig, build_registry};
use crate::infrastructure::sink::{FsBatchSink, validate_batch_id};

/// Everything a batch needs once the process is configured. Cheap to clone.
#[derive(Clone)]
pub struct PipelineContext {
    pub registry: Arc<RuleRegistry>,
    pub audit: Arc<dyn AuditSink>,
    pub promoted_sink: Arc<dyn BatchSink>,
    pub quarantine_sink: Arc<dyn BatchSink>,
    pub policy: PromotionPolicy,
    pub source_layer: DataLayer,
    pub concurrency: usize,
}

impl PipelineContext {
    /// Same sink for promoted and quarantined batches.
    pub fn new(
        registry: Arc<RuleRegistry>,
        audit: Arc<dyn AuditSink>,
        sink: Arc<dyn BatchSink>,
    ) -> Self {
        Self {
            registry,
            audit,
            promoted_sink: sink.clone(),
            quarantine_sink: sink,
            policy: PromotionPolicy::default(),
            source_layer: DataLayer::default(),
            concurrency: 4,
        }
    }

    pub fn with_policy(mut self, policy: PromotionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_source_layer(mut self, layer: DataLayer) -> Self {
        self.source_layer = layer;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_quarantine_sink(mut self, sink: Arc<dyn BatchSink>) -> Self {
        self.quarantine_sink = sink;
        self
    }

    /// Wires the file-system adapters described by the project configuration.
    pub fn from_config(config: &ProjectConfig, project_dir: &Path) -> Result<Self, TrialGateError> {
        let registry = build_registry(config, project_dir)?;
        let audit = JsonlAuditLog::new(config.audit_log_path(project_dir));
        let sink = FsBatchSink::new(config.target_dir(project_dir));

        Ok(Self::new(Arc::new(registry), Arc::new(audit), Arc::new(sink))
            .with_policy(config.policy)
            .with_source_layer(config.source_layer)
            .with_concurrency(config.concurrency))
    }
}

#[derive(Debug, Clone)]
pub struct BatchInput {
    pub batch_id: String,
    pub domain: ClinicalDomain,
    pub records: Vec<Record>,
    /// Where the records were read from, for lineage.
    pub source: Option<String>,
}

impl BatchInput {
    pub fn new(batch_id: impl Into<String>, domain: ClinicalDomain, records: Vec<Record>) -> Self {
        Self {
            batch_id: batch_id.into(),
            domain,
            records,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub decision: PromotionDecision,
    pub delivered_to: String,
}

impl BatchOutcome {
    pub fn is_promoted(&self) -> bool {
        self.decision.is_promoted()
    }
}

/// Assess -> decide (audited) -> deliver.
///
/// Nothing is delivered unless the decision was durably audited.
#[instrument(skip_all, fields(batch_id = %input.batch_id, domain = %input.domain))]
pub async fn process_batch(
    ctx: &PipelineContext,
    input: &BatchInput,
    references: &dyn ReferenceSetProvider,
) -> Result<BatchOutcome, TrialGateError> {
    validate_batch_id(&input.batch_id)?;

    let report = BatchAssessor::new(&ctx.registry).assess(input.domain, &input.records, references)?;

    let routes = BatchRoutes {
        source: input.source.clone(),
        on_promote: ctx.promoted_sink.locate(
            ctx.source_layer.promotion_target(),
            input.domain,
            &input.batch_id,
        ),
        on_quarantine: ctx
            .quarantine_sink
            .locate(DataLayer::Quarantine, input.domain, &input.batch_id),
    };

    let decision = PromotionGate::new(ctx.audit.as_ref())
        .with_source_layer(ctx.source_layer)?
        .with_routes(routes)
        .decide(&input.batch_id, report, &ctx.policy)?;

    let sink = match decision.decision {
        Decision::Promote => &ctx.promoted_sink,
        Decision::Quarantine => &ctx.quarantine_sink,
    };
    let delivered_to = sink.deliver(&decision, &input.records).await?;

    Ok(BatchOutcome {
        decision,
        delivered_to,
    })
}

/// Batch ids become file names: every id must be safe and unique within its domain.
fn check_inputs(inputs: &[BatchInput]) -> Result<(), TrialGateError> {
    let mut seen = HashSet::new();
    for input in inputs {
        validate_batch_id(&input.batch_id)?;
        if !seen.insert((input.domain, input.batch_id.as_str())) {
            return Err(TrialGateError::DuplicateBatch {
                domain: input.domain.code().to_string(),
                batch_id: input.batch_id.clone(),
            });
        }
    }
    Ok(())
}

/// Runs several batches and returns their outcomes in input order.
///
/// Inputs are checked first (safe, unique batch ids): a bad input fails the run
/// before anything is assessed. Demographics batches then go one at a time: the
/// subject ids of the promoted ones join the `USUBJID` reference set used by the
/// other domains. An error there stops the run before any other batch starts.
///
/// The remaining batches run in parallel (at most `ctx.concurrency`), sharing the
/// registry read-only. Batches already started are not cancelled when one of them
/// fails: they finish their audit and delivery, and the first error is returned
/// once all are done. Their decisions stay in the audit trail.
#[instrument(skip_all, fields(batches = inputs.len()))]
pub async fn run_batches(
    ctx: &PipelineContext,
    inputs: Vec<BatchInput>,
    mut references: ReferenceSets,
) -> Result<Vec<BatchOutcome>, TrialGateError> {
    check_inputs(&inputs)?;

    let start_time = Instant::now();
    let total = inputs.len();
    let mut slots: Vec<Option<BatchOutcome>> = vec![None; total];

    let (subjects, others): (Vec<_>, Vec<_>) = inputs
        .into_iter()
        .enumerate()
        .partition(|(_, input)| input.domain == ClinicalDomain::Demographics);

    // 1. SUBJECTS (sequential, feeds the reference sets)
    let subject_field = ClinicalDomain::Demographics.subject_field();
    references.extend(subject_field, std::iter::empty::<String>());
    for (idx, input) in subjects {
        let outcome = process_batch(ctx, &input, &references).await?;
        if outcome.is_promoted() {
            references.collect_field(subject_field, subject_field, &input.records);
        } else {
            warn!(batch_id = %input.batch_id, "Subjects of a quarantined DM batch are not referenceable");
        }
        slots[idx] = Some(outcome);
    }

    // 2. OTHER DOMAINS (parallel, bounded)
    let references = Arc::new(references);
    let tasks = others.into_iter().map(|(idx, input)| {
        let ctx = ctx.clone();
        let references = Arc::clone(&references);
        async move {
            let handle = tokio::spawn(async move {
                process_batch(&ctx, &input, references.as_ref()).await
            });
            let result = handle
                .await
                .map_err(|e| TrialGateError::InternalError(format!("Batch task failed: {}", e)))
                .and_then(|res| res);
            (idx, result)
        }
    });

    let results: Vec<_> = futures::stream::iter(tasks)
        .buffer_unordered(ctx.concurrency.max(1))
        .collect()
        .await;

    let mut first_error = None;
    for (idx, result) in results {
        match result {
            Ok(outcome) => slots[idx] = Some(outcome),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }
    if let Some(err) = first_error {
        for outcome in slots.iter().flatten() {
            warn!(
                batch_id = %outcome.decision.batch_id,
                decision = %outcome.decision.decision,
                "Batch decided before the run failed"
            );
        }
        return Err(err);
    }

    let outcomes: Vec<BatchOutcome> = slots.into_iter().flatten().collect();
    let promoted = outcomes.iter().filter(|o| o.is_promoted()).count();
    info!(
        promoted,
        quarantined = outcomes.len() - promoted,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Run finished"
    );
    Ok(outcomes)
}

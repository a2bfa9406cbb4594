// trialgate/src/commands/assess.rs
//
// USE CASE: Assess one batch, decide, deliver.

use anyhow::{Context, bail};
use std::path::{Path, PathBuf};
use tracing::debug;

use trialgate_core::application::{BatchInput, PipelineContext, process_batch};
use trialgate_core::domain::promotion::Decision;
use trialgate_core::domain::quality::{BatchAssessor, ClinicalDomain, ReferenceSets};
use trialgate_core::infrastructure::config::load_project_config_or_default;
use trialgate_core::infrastructure::read_records;

use super::Verdict;
use super::output::{print_decision, print_report};

/// `KEY=path[:FIELD]`: FIELD defaults to KEY.
#[derive(Debug, PartialEq)]
pub struct ReferenceArg {
    pub key: String,
    pub path: PathBuf,
    pub field: String,
}

impl ReferenceArg {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let Some((key, rest)) = raw.split_once('=') else {
            bail!("Invalid reference '{}': expected KEY=path[:FIELD]", raw);
        };
        if key.trim().is_empty() || rest.trim().is_empty() {
            bail!("Invalid reference '{}': expected KEY=path[:FIELD]", raw);
        }
        let (path, field) = match rest.rsplit_once(':') {
            Some((path, field)) if !field.is_empty() && !field.contains(['/', '\\']) => {
                (path, field)
            }
            _ => (rest, key),
        };
        Ok(Self {
            key: key.trim().to_string(),
            path: PathBuf::from(path),
            field: field.trim().to_string(),
        })
    }
}

pub fn load_references(raw: &[String], base_dir: &Path) -> anyhow::Result<ReferenceSets> {
    let mut references = ReferenceSets::new();
    for arg in raw {
        let reference = ReferenceArg::parse(arg)?;
        let path = base_dir.join(&reference.path);
        let records = read_records(&path)
            .with_context(|| format!("Failed to read reference set '{}'", reference.key))?;
        debug!(key = %reference.key, path = ?path, records = records.len(), "Reference set loaded");
        references.collect_field(&reference.key, &reference.field, &records);
    }
    Ok(references)
}

pub async fn execute(
    domain: String,
    records_path: PathBuf,
    batch_id: Option<String>,
    references: Vec<String>,
    project_dir: PathBuf,
    dry_run: bool,
) -> anyhow::Result<Verdict> {
    let domain: ClinicalDomain = domain.parse()?;

    println!("⚙️  Loading configuration...");
    let config = load_project_config_or_default(&project_dir)?;
    let ctx = PipelineContext::from_config(&config, &project_dir)?;
    println!("   Project: {} (v{})", config.name, config.version);

    let records = read_records(&records_path)?;
    let references = load_references(&references, Path::new("."))?;
    let batch_id = match batch_id {
        Some(id) => id,
        None => records_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .with_context(|| format!("Cannot derive a batch id from {:?}", records_path))?,
    };
    println!("🔬 Assessing {} {} record(s) from {}", records.len(), domain, records_path.display());

    if dry_run {
        let report = BatchAssessor::new(&ctx.registry).assess(domain, &records, &references)?;
        print_report(&report);
        let (decision, reason) = ctx.policy.evaluate(&report);
        println!("🧪 Dry run: would {} batch '{}' ({})", decision, batch_id, reason);
        return Ok(match decision {
            Decision::Promote => Verdict::Promoted,
            Decision::Quarantine => Verdict::Quarantined,
        });
    }

    let input = BatchInput::new(batch_id, domain, records)
        .with_source(records_path.display().to_string());
    let outcome = process_batch(&ctx, &input, &references).await?;
    print_report(&outcome.decision.report);
    print_decision(&outcome.decision, Some(&outcome.delivered_to));

    Ok(if outcome.is_promoted() {
        Verdict::Promoted
    } else {
        Verdict::Quarantined
    })
}

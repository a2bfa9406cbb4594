// trialgate/src/commands/run.rs
//
// USE CASE: Run every batch of a manifest through the gate.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use trialgate_core::application::{BatchInput, PipelineContext, run_batches};
use trialgate_core::domain::quality::ClinicalDomain;
use trialgate_core::infrastructure::config::load_project_config_or_default;
use trialgate_core::infrastructure::read_records;

use super::Verdict;
use super::assess::load_references;
use super::output::print_decision;

#[derive(Debug, Deserialize)]
pub struct BatchManifest {
    /// Extra reference sets, same syntax as `assess --reference`.
    #[serde(default)]
    pub references: Vec<String>,
    pub batches: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub batch_id: String,
    pub domain: String,
    pub path: PathBuf,
}

pub fn load_manifest(path: &Path) -> anyhow::Result<BatchManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse manifest {:?}", path))
}

pub async fn execute(manifest_path: PathBuf, project_dir: PathBuf) -> anyhow::Result<Verdict> {
    let start = std::time::Instant::now();

    println!("⚙️  Loading configuration...");
    let config = load_project_config_or_default(&project_dir)?;
    let ctx = PipelineContext::from_config(&config, &project_dir)?;
    println!("   Project: {} (v{})", config.name, config.version);

    // Manifest paths are relative to the manifest itself
    let manifest = load_manifest(&manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut inputs = Vec::with_capacity(manifest.batches.len());
    for entry in &manifest.batches {
        let domain: ClinicalDomain = entry.domain.parse()?;
        let path = base_dir.join(&entry.path);
        let records = read_records(&path)?;
        inputs.push(
            BatchInput::new(entry.batch_id.clone(), domain, records)
                .with_source(path.display().to_string()),
        );
    }
    let references = load_references(&manifest.references, base_dir)?;

    println!("🚀 Processing {} batch(es)...", inputs.len());
    let outcomes = run_batches(&ctx, inputs, references).await?;

    for outcome in &outcomes {
        print_decision(&outcome.decision, Some(&outcome.delivered_to));
    }

    let quarantined = outcomes.iter().filter(|o| !o.is_promoted()).count();
    if quarantined == 0 {
        println!("\n✨ SUCCESS! {} batch(es) promoted in {:.2?}", outcomes.len(), start.elapsed());
        Ok(Verdict::Promoted)
    } else {
        eprintln!(
            "\n❌ {} of {} batch(es) quarantined. See {}",
            quarantined,
            outcomes.len(),
            config.audit_log_path(&project_dir).display()
        );
        Ok(Verdict::Quarantined)
    }
}

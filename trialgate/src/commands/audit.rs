// trialgate/src/commands/audit.rs
//
// USE CASE: Read back the promotion decisions.

use std::path::PathBuf;

use trialgate_core::infrastructure::config::load_project_config_or_default;
use trialgate_core::infrastructure::read_audit_log;

use trialgate_core::domain::promotion::QualitySummary;

use super::output::{audit_table, summary_table};

pub fn execute(project_dir: PathBuf, limit: usize, summary: bool) -> anyhow::Result<()> {
    let config = load_project_config_or_default(&project_dir)?;
    let path = config.audit_log_path(&project_dir);
    let entries = read_audit_log(&path)?;

    if entries.is_empty() {
        println!("🧾 No decision recorded yet in {}", path.display());
        return Ok(());
    }

    if summary {
        let summary = QualitySummary::from_decisions(&entries);
        println!("📊 Quality summary over {} decision(s) in {}", entries.len(), path.display());
        println!("{}", summary_table(&summary));
        println!(
            "   Overall status: {} (record pass rate {:.1}%, quarantine rate {:.1}%)",
            summary.status(),
            summary.overall.pass_rate_pct(),
            summary.overall.quarantine_rate_pct()
        );
        return Ok(());
    }

    let shown = &entries[entries.len().saturating_sub(limit)..];
    println!("🧾 Last {} of {} decision(s) in {}", shown.len(), entries.len(), path.display());
    println!("{}", audit_table(shown));
    Ok(())
}

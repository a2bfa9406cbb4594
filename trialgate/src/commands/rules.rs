// trialgate/src/commands/rules.rs
//
// USE CASE: Show which rules the gate will apply.

use std::path::PathBuf;

use trialgate_core::domain::quality::ClinicalDomain;
use trialgate_core::infrastructure::config::{build_registry, load_project_config_or_default};

use super::output::rules_table;

pub fn execute(domain: Option<String>, project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_project_config_or_default(&project_dir)?;
    let registry = build_registry(&config, &project_dir)?;

    let domains: Vec<ClinicalDomain> = match domain {
        Some(code) => vec![code.parse()?],
        None => registry.domains(),
    };

    let mut rules = Vec::new();
    for domain in domains {
        rules.extend(registry.load(domain)?.iter().cloned());
    }

    println!("📋 {} rule(s)", rules.len());
    println!("{}", rules_table(&rules));
    Ok(())
}

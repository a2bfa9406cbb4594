// trialgate-core/src/infrastructure/config/rules.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use super::project::ProjectConfig;
use crate::domain::quality::{ClinicalDomain, RuleDefinition, RuleRegistry};
use crate::error::TrialGateError;
use crate::infrastructure::error::InfrastructureError;

// Catalog shipped with the library, loaded through the same path as user files
const BUILTIN_CATALOG: [(&str, &str); 4] = [
    ("builtin:dm.yaml", include_str!("../../../rules/dm.yaml")),
    ("builtin:ae.yaml", include_str!("../../../rules/ae.yaml")),
    ("builtin:vs.yaml", include_str!("../../../rules/vs.yaml")),
    ("builtin:lb.yaml", include_str!("../../../rules/lb.yaml")),
];

/// One rule file: a domain and its ordered rules.
/// Entries stay loosely typed here; each one is checked when it is compiled into the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFile {
    pub domain: String,

    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl RuleFile {
    pub fn parse(content: &str) -> Result<Self, InfrastructureError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Registers every rule of this file, stopping at the first invalid one.
    pub fn register_into(&self, registry: &mut RuleRegistry) -> Result<usize, TrialGateError> {
        let domain: ClinicalDomain = self.domain.parse()?;
        registry.register_domain(domain);
        for definition in &self.rules {
            registry.add_definition(domain, definition)?;
        }
        Ok(self.rules.len())
    }
}

pub fn builtin_rule_files() -> Result<Vec<RuleFile>, InfrastructureError> {
    BUILTIN_CATALOG
        .iter()
        .map(|(name, content)| {
            RuleFile::parse(content).map_err(|e| {
                InfrastructureError::ConfigError(format!("Invalid built-in catalog {}: {}", name, e))
            })
        })
        .collect()
}

/// Rule files (`*.yaml`, `*.yml`) under `dirs`, sorted by path so loading order is stable.
pub fn discover_rule_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        if !dir.exists() {
            debug!(path = ?dir, "Rule directory does not exist, skipping");
            continue;
        }
        let walker = WalkDir::new(dir).follow_links(true);
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files
}

pub fn load_rule_file(path: &Path) -> Result<RuleFile, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    RuleFile::parse(&content).map_err(|e| {
        InfrastructureError::ConfigError(format!("Invalid rule file {:?}: {}", path, e))
    })
}

/// Builds the registry once at startup: built-in catalog (unless disabled), then user rule files.
/// Any invalid or duplicate rule aborts the whole load.
#[instrument(skip_all, fields(project = %config.name))]
pub fn build_registry(
    config: &ProjectConfig,
    project_dir: &Path,
) -> Result<RuleRegistry, TrialGateError> {
    let mut registry = RuleRegistry::new();

    if config.builtin_rules {
        for file in builtin_rule_files()? {
            file.register_into(&mut registry)?;
        }
    }

    for path in discover_rule_files(&config.rule_dirs(project_dir)) {
        let file = load_rule_file(&path)?;
        let count = file.register_into(&mut registry)?;
        info!(path = ?path, domain = %file.domain, rules = count, "Rule file loaded");
    }

    info!(
        domains = registry.domains().len(),
        rules = registry.rule_count(),
        "Rule registry ready"
    );
    Ok(registry)
}

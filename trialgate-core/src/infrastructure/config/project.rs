// trialgate-core/src/infrastructure/config/project.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use validator::{Validate, ValidationError};

use crate::domain::promotion::{DataLayer, PromotionPolicy};
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["trialgate_project.yaml", "trialgate.yaml"];

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "project name cannot be empty"))]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Directories scanned recursively for rule files.
    #[serde(rename = "rule-paths", default)]
    pub rule_paths: Vec<String>,

    #[serde(rename = "builtin-rules", default = "default_true")]
    pub builtin_rules: bool,

    #[serde(rename = "target-path", default = "default_target_path")]
    pub target_path: String,

    /// Defaults to `<target-path>/audit/decisions.jsonl`.
    #[serde(rename = "audit-log", default)]
    pub audit_log: Option<String>,

    #[validate(custom(function = "validate_source_layer"))]
    #[serde(rename = "source-layer", default)]
    pub source_layer: DataLayer,

    #[serde(default)]
    pub policy: PromotionPolicy,

    #[validate(range(min = 1, message = "concurrency must be at least 1"))]
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "trialgate".to_string(),
            version: default_version(),
            rule_paths: Vec::new(),
            builtin_rules: true,
            target_path: default_target_path(),
            audit_log: None,
            source_layer: DataLayer::default(),
            policy: PromotionPolicy::default(),
            concurrency: default_concurrency(),
        }
    }
}

impl ProjectConfig {
    pub fn target_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.target_path)
    }

    pub fn audit_log_path(&self, project_dir: &Path) -> PathBuf {
        match &self.audit_log {
            Some(path) => project_dir.join(path),
            None => self.target_dir(project_dir).join("audit").join("decisions.jsonl"),
        }
    }

    pub fn rule_dirs(&self, project_dir: &Path) -> Vec<PathBuf> {
        self.rule_paths.iter().map(|p| project_dir.join(p)).collect()
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}
fn default_true() -> bool {
    true
}
fn default_target_path() -> String {
    "target".to_string()
}
fn default_concurrency() -> usize {
    4
}

fn validate_source_layer(layer: &DataLayer) -> Result<(), ValidationError> {
    if *layer == DataLayer::Quarantine {
        return Err(ValidationError::new("quarantine_source")
            .with_message("batches cannot be promoted out of quarantine".into()));
    }
    Ok(())
}

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    // 1. Main file discovery
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    // 2. YAML base
    let content = fs::read_to_string(&config_path)?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)?;

    // 3. Environment overrides (layering), e.g. TRIALGATE_TARGET_PATH=/tmp/run trialgate run ...
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;

    Ok(config)
}

/// Same as `load_project_config`, but a missing file yields the defaults.
pub fn load_project_config_or_default(
    project_dir: &Path,
) -> Result<ProjectConfig, InfrastructureError> {
    match load_project_config(project_dir) {
        Err(InfrastructureError::ConfigNotFound(msg)) => {
            warn!("{}. Falling back to defaults (built-in rules, default policy)", msg);
            let mut config = ProjectConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            Ok(config)
        }
        other => other,
    }
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("TRIALGATE_TARGET_PATH") {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Some(val) = lookup("TRIALGATE_AUDIT_LOG") {
        info!(old = ?config.audit_log, new = ?val, "Overriding audit log via ENV");
        config.audit_log = Some(val);
    }
}

pub mod project;
pub mod rules;

pub use project::{ProjectConfig, load_project_config, load_project_config_or_default};
pub use rules::{RuleFile, build_registry, discover_rule_files, load_rule_file};

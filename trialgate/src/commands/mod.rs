// trialgate/src/commands/mod.rs

pub mod assess;
pub mod audit;
pub mod output;
pub mod rules;
pub mod run;

/// What the process exit code reports to CI/CD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Promoted,
    Quarantined,
}

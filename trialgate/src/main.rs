// trialgate/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::Verdict;
use trialgate_core::TrialGateError;
use trialgate_core::domain::DomainError;
use trialgate_core::infrastructure::error::InfrastructureError;

// 0: promoted, 1: quarantined (CI/CD gate), 2: configuration/audit/IO failure
const EXIT_QUARANTINED: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug trialgate assess ... to see every failed check
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        // --- USE CASE: ASSESS ONE BATCH ---
        Commands::Assess {
            domain,
            records,
            batch_id,
            references,
            project_dir,
            dry_run,
        } => {
            commands::assess::execute(domain, records, batch_id, references, project_dir, dry_run)
                .await
        }

        // --- USE CASE: RUN A MANIFEST ---
        Commands::Run {
            manifest,
            project_dir,
        } => commands::run::execute(manifest, project_dir).await,

        // --- USE CASE: LIST RULES ---
        Commands::Rules {
            domain,
            project_dir,
        } => commands::rules::execute(domain, project_dir).map(|_| Verdict::Promoted),

        // --- USE CASE: READ THE AUDIT TRAIL ---
        Commands::Audit {
            project_dir,
            limit,
            summary,
        } => commands::audit::execute(project_dir, limit, summary).map(|_| Verdict::Promoted),
    };

    match result {
        Ok(Verdict::Promoted) => ExitCode::SUCCESS,
        Ok(Verdict::Quarantined) => ExitCode::from(EXIT_QUARANTINED),
        Err(err) => {
            report_error(err);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Core errors carry miette diagnostics (code + help): render them fully.
fn report_error(err: anyhow::Error) {
    let headline = err.to_string();

    let report = match err.downcast::<TrialGateError>() {
        Ok(e) => miette::Report::new(e),
        Err(err) => match err.downcast::<DomainError>() {
            Ok(e) => miette::Report::new(e),
            Err(err) => match err.downcast::<InfrastructureError>() {
                Ok(e) => miette::Report::new(e),
                Err(other) => {
                    eprintln!("\n💥 {:#}", other);
                    return;
                }
            },
        },
    };

    if headline != report.to_string() {
        eprintln!("\n💥 {}", headline);
    }
    eprintln!("{:?}", report);
}

// trialgate/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trialgate")]
#[command(about = "CDISC data-quality gate: validate clinical batches, promote or quarantine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🔬 Assesses one batch of records and runs it through the promotion gate
    Assess {
        /// Clinical domain (DM, AE, VS, LB or their long names)
        #[arg(long, short)]
        domain: String,

        /// Records file (JSON array or JSON lines)
        #[arg(long, short)]
        records: PathBuf,

        /// Batch identifier (defaults to the records file name)
        #[arg(long)]
        batch_id: Option<String>,

        /// Reference set as KEY=path[:FIELD] (ex: USUBJID=dm.json)
        #[arg(long = "reference", value_name = "KEY=PATH[:FIELD]")]
        references: Vec<String>,

        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Only print the report: no audit entry, no delivery
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// 🚀 Processes every batch listed in a manifest (DM first, then the rest in parallel)
    Run {
        /// Manifest file listing { batch_id, domain, path }
        #[arg(long, short)]
        manifest: PathBuf,

        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 📋 Lists the loaded validation rules
    Rules {
        /// Only this domain
        #[arg(long, short)]
        domain: Option<String>,

        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🧾 Shows the latest promotion decisions from the audit log
    Audit {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Per-domain quality summary over the whole trail instead of the entries
        #[arg(long, default_value = "false")]
        summary: bool,
    },
}

use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Isolated project directory seeded with the record fixtures.
struct TrialGateTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl TrialGateTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

        let root = tmp.path().join("study");
        std::fs::create_dir_all(&root)?;
        for entry in std::fs::read_dir(&fixtures).context("Fixtures directory not found")? {
            let entry = entry?;
            std::fs::copy(entry.path(), root.join(entry.file_name()))?;
        }

        Ok(Self { _tmp: tmp, root })
    }

    fn trialgate(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("trialgate"));
        cmd.current_dir(&self.root);
        cmd.env_remove("TRIALGATE_TARGET_PATH");
        cmd.env_remove("TRIALGATE_AUDIT_LOG");
        cmd
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    fn audit_lines(&self) -> Result<Vec<serde_json::Value>> {
        let path = self.path("target/audit/decisions.jsonl");
        if !path.exists() {
            return Ok(Vec::new());
        }
        std::fs::read_to_string(path)?
            .lines()
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }

    fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn exists(path: &Path) -> bool {
    path.is_file()
}

#[test]
fn test_assess_clean_batch_is_promoted() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["assess", "--domain", "DM", "--records", "dm_clean.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROMOTE"))
        .stdout(predicate::str::contains("DM_001"));

    assert!(exists(&env.path("target/silver/DM/dm_clean.json")));

    let audit = env.audit_lines()?;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0]["batch_id"], "dm_clean");
    assert_eq!(audit[0]["decision"], "PROMOTE");
    assert_eq!(audit[0]["report"]["total_records"], 3);
    Ok(())
}

#[test]
fn test_assess_invalid_batch_is_quarantined() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["assess", "-d", "demographics", "-r", "dm_invalid.json", "--batch-id", "dm-bad"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("QUARANTINE"))
        .stdout(predicate::str::contains("AGE value 150 outside"));

    assert!(exists(&env.path("target/quarantine/DM/dm-bad.json")));
    assert!(!env.path("target/silver").exists());

    let audit = env.audit_lines()?;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0]["decision"], "QUARANTINE");
    assert_eq!(audit[0]["report"]["error_failures"], 3);
    assert_eq!(audit[0]["report"]["completeness_pct"], 33.3);
    Ok(())
}

#[test]
fn test_assess_requires_reference_set_for_referential_rules() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["assess", "--domain", "AE", "--records", "ae.jsonl"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing_reference_set"));

    // Configuration errors never reach the audit trail
    assert!(env.audit_lines()?.is_empty());
    Ok(())
}

#[test]
fn test_assess_with_reference_set() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args([
            "assess",
            "--domain",
            "AE",
            "--records",
            "ae.jsonl",
            "--reference",
            "USUBJID=dm_clean.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROMOTE"));

    assert!(exists(&env.path("target/silver/AE/ae.json")));
    Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["assess", "--domain", "DM", "--records", "dm_invalid.json", "--dry-run"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Dry run: would QUARANTINE"));

    assert!(!env.path("target").exists());
    Ok(())
}

#[test]
fn test_unknown_domain_is_a_configuration_error() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["assess", "--domain", "XX", "--records", "dm_clean.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown_domain"));
    Ok(())
}

#[test]
fn test_unsafe_batch_id_refused() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["assess", "-d", "DM", "-r", "dm_clean.json", "--batch-id", "../escape"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsafe path"));

    assert!(env.audit_lines()?.is_empty());
    Ok(())
}

#[test]
fn test_run_manifest_processes_dm_first() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["run", "--manifest", "manifest.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ae-2024-01"))
        .stdout(predicate::str::contains("vs-2024-01"))
        .stdout(predicate::str::contains("SUCCESS"));

    let audit = env.audit_lines()?;
    assert_eq!(audit.len(), 3);
    assert_eq!(audit[0]["batch_id"], "dm-2024-01");

    // VS_003 is a WARNING: out-of-range pulse is tolerated by the default policy
    let vs = audit
        .iter()
        .find(|entry| entry["batch_id"] == "vs-2024-01")
        .context("VS decision missing")?;
    assert_eq!(vs["decision"], "PROMOTE");
    assert_eq!(vs["report"]["warning_failures"], 1);
    assert_eq!(vs["report"]["status"], "PASSED_WITH_WARNINGS");

    assert!(exists(&env.path("target/silver/VS/vs-2024-01.json")));
    Ok(())
}

#[test]
fn test_delivered_batch_keeps_input_values_and_lineage() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["assess", "--domain", "DM", "--records", "dm_clean.json"])
        .assert()
        .success();

    let delivered = env.path("target/silver/DM/dm_clean.json");
    let batch: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&delivered)?)?;
    // Integers stay integers, dates stay as written
    assert_eq!(batch["records"][0]["AGE"].to_string(), "34");
    assert_eq!(batch["records"][0]["RFSTDTC"], "2024-01-08");

    let audit = env.audit_lines()?;
    let lineage = &audit[0]["lineage"];
    assert!(lineage["source"].as_str().context("source missing")?.ends_with("dm_clean.json"));
    assert!(
        lineage["destination"]
            .as_str()
            .context("destination missing")?
            .ends_with("target/silver/DM/dm_clean.json")
    );
    assert_eq!(lineage["record_count"], 3);
    Ok(())
}

#[test]
fn test_run_rejects_duplicate_batch_ids() -> Result<()> {
    let env = TrialGateTestEnv::new()?;
    env.write(
        "dup.yaml",
        r#"
batches:
  - { batch_id: dm, domain: DM, path: dm_clean.json }
  - { batch_id: dm, domain: demographics, path: dm_no_arm.json }
"#,
    )?;

    env.trialgate()
        .args(["run", "--manifest", "dup.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("duplicate_batch"));

    assert!(env.audit_lines()?.is_empty());
    assert!(!env.path("target/silver").exists());
    Ok(())
}

#[test]
fn test_audit_summary_reports_pass_rates() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["assess", "-d", "DM", "-r", "dm_clean.json"])
        .assert()
        .success();
    env.trialgate()
        .args(["assess", "-d", "DM", "-r", "dm_invalid.json"])
        .assert()
        .code(1);

    // 4 of 6 records passed every rule
    env.trialgate()
        .args(["audit", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quality summary over 2 decision(s)"))
        .stdout(predicate::str::contains("66.7"))
        .stdout(predicate::str::contains("Overall status: CRITICAL"));
    Ok(())
}

#[test]
fn test_project_policy_can_block_warnings() -> Result<()> {
    let env = TrialGateTestEnv::new()?;
    env.write(
        "trialgate.yaml",
        r#"
name: cdisc01
version: "1.0.0"
target-path: build
audit-log: build/lineage.jsonl
policy:
  max_warning_failures: 0
"#,
    )?;

    // DM_005 (ARM) is a WARNING
    env.trialgate()
        .args(["assess", "--domain", "DM", "--records", "dm_no_arm.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("WARNING failure(s) exceed"));

    assert!(exists(&env.path("build/quarantine/DM/dm_no_arm.json")));
    assert!(exists(&env.path("build/lineage.jsonl")));
    Ok(())
}

#[test]
fn test_project_rule_files_are_loaded() -> Result<()> {
    let env = TrialGateTestEnv::new()?;
    env.write("trialgate.yaml", "name: cdisc01\nrule-paths: [rules]\n")?;
    env.write(
        "rules/dm_sites.yaml",
        r#"
domain: DM
rules:
  - id: DM_100
    check: not_null
    field: SITEID
    severity: ERROR
    description: Site identifier is required
"#,
    )?;

    env.trialgate()
        .args(["rules", "--domain", "DM"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DM_100"))
        .stdout(predicate::str::contains("7 rule(s)"));

    // dm_clean.json has no SITEID
    env.trialgate()
        .args(["assess", "--domain", "DM", "--records", "dm_clean.json"])
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn test_invalid_rule_file_refuses_to_start() -> Result<()> {
    let env = TrialGateTestEnv::new()?;
    env.write("trialgate.yaml", "name: cdisc01\nrule-paths: [rules]\n")?;
    env.write(
        "rules/broken.yaml",
        "domain: DM\nrules:\n  - { id: DM_200, check: range, field: AGE, min: 90, max: 10 }\n",
    )?;

    env.trialgate()
        .args(["rules"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid_rule"));
    Ok(())
}

#[test]
fn test_audit_lists_latest_decisions() -> Result<()> {
    let env = TrialGateTestEnv::new()?;

    env.trialgate()
        .args(["audit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No decision recorded yet"));

    env.trialgate()
        .args(["assess", "-d", "DM", "-r", "dm_clean.json", "--batch-id", "first"])
        .assert()
        .success();
    env.trialgate()
        .args(["assess", "-d", "DM", "-r", "dm_invalid.json", "--batch-id", "second"])
        .assert()
        .code(1);

    env.trialgate()
        .args(["audit", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("second"))
        .stdout(predicate::str::contains("first").not());
    Ok(())
}

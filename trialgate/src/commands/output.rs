// trialgate/src/commands/output.rs
//
// Terminal rendering shared by the commands (comfy-table).

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use trialgate_core::domain::promotion::{Decision, PromotionDecision, QualitySummary, SummaryCounts};
use trialgate_core::domain::quality::{QualityReport, Rule, Severity, ValidationStatus};

// Longer failure lists are truncated on screen; the audit log keeps them all
const MAX_FAILURE_ROWS: usize = 25;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn severity_cell(severity: Severity) -> Cell {
    let color = match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
    };
    Cell::new(severity.as_str()).fg(color)
}

fn decision_cell(decision: Decision) -> Cell {
    let color = match decision {
        Decision::Promote => Color::Green,
        Decision::Quarantine => Color::Red,
    };
    Cell::new(decision.as_str()).fg(color)
}

pub fn print_report(report: &QualityReport) {
    let status_icon = match report.status {
        ValidationStatus::Passed => "✅",
        ValidationStatus::PassedWithWarnings => "⚠️ ",
        ValidationStatus::Failed => "❌",
    };
    println!(
        "\n{} {} ({}) - {}",
        status_icon,
        report.domain.code(),
        report.domain.long_name(),
        report.status.as_str()
    );
    println!(
        "   Records: {} | Clean: {} | ERROR failures: {} | WARNING failures: {} | Completeness: {:.1}%",
        report.total_records,
        report.passed,
        report.error_failures,
        report.warning_failures,
        report.completeness_pct
    );
    if report.zero_records {
        println!("   (empty batch)");
        return;
    }

    let mut rules = new_table(vec!["Rule", "Check", "Field", "Severity", "Failures", "Failure %"]);
    for summary in &report.rule_summaries {
        rules.add_row(vec![
            Cell::new(&summary.rule_id),
            Cell::new(&summary.check),
            Cell::new(&summary.target_field),
            severity_cell(summary.severity),
            Cell::new(summary.failures),
            Cell::new(format!("{:.2}", summary.failure_pct)),
        ]);
    }
    println!("{rules}");

    if report.outcomes.is_empty() {
        return;
    }
    let mut failures = new_table(vec!["Record", "Rule", "Severity", "Message"]);
    for outcome in report.outcomes.iter().take(MAX_FAILURE_ROWS) {
        failures.add_row(vec![
            Cell::new(&outcome.record),
            Cell::new(&outcome.rule_id),
            severity_cell(outcome.severity),
            Cell::new(outcome.message.as_deref().unwrap_or("")),
        ]);
    }
    println!("{failures}");
    if report.outcomes.len() > MAX_FAILURE_ROWS {
        println!("   ... {} more failure(s)", report.outcomes.len() - MAX_FAILURE_ROWS);
    }
}

pub fn print_decision(decision: &PromotionDecision, delivered_to: Option<&str>) {
    let icon = if decision.is_promoted() { "🟢" } else { "🔴" };
    println!(
        "{} {} batch '{}': {} -> {} ({})",
        icon,
        decision.decision,
        decision.batch_id,
        decision.source_layer,
        decision.target_layer,
        decision.reason
    );
    if let Some(location) = delivered_to {
        println!("   📦 {}", location);
    }
}

pub fn rules_table(rules: &[Rule]) -> Table {
    let mut table = new_table(vec!["Rule", "Domain", "Field", "Check", "Parameters", "Severity", "Description"]);
    for rule in rules {
        table.add_row(vec![
            Cell::new(&rule.rule_id),
            Cell::new(rule.domain.code()),
            Cell::new(&rule.target_field),
            Cell::new(rule.check.name()),
            Cell::new(rule.check.parameters()),
            severity_cell(rule.severity),
            Cell::new(rule.description.as_deref().unwrap_or("")),
        ]);
    }
    table
}

pub fn audit_table(entries: &[PromotionDecision]) -> Table {
    let mut table = new_table(vec![
        "Decided at", "Batch", "Domain", "Decision", "Records", "Errors", "Warnings", "Source", "Destination",
        "Reason",
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.decided_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&entry.batch_id),
            Cell::new(entry.domain.code()),
            decision_cell(entry.decision),
            Cell::new(entry.report.total_records),
            Cell::new(entry.report.error_failures),
            Cell::new(entry.report.warning_failures),
            Cell::new(entry.lineage.source.as_deref().unwrap_or("-")),
            Cell::new(
                entry
                    .lineage
                    .destination
                    .clone()
                    .unwrap_or_else(|| entry.target_layer.to_string()),
            ),
            Cell::new(&entry.reason),
        ]);
    }
    table
}

fn summary_row(label: &str, counts: &SummaryCounts) -> Vec<Cell> {
    vec![
        Cell::new(label),
        Cell::new(counts.batches),
        Cell::new(counts.promoted),
        Cell::new(counts.quarantined),
        Cell::new(counts.records),
        Cell::new(format!("{:.1}", counts.pass_rate_pct())),
        Cell::new(format!("{:.1}", counts.quarantine_rate_pct())),
    ]
}

pub fn summary_table(summary: &QualitySummary) -> Table {
    let mut table = new_table(vec![
        "Domain", "Batches", "Promoted", "Quarantined", "Records", "Pass %", "Quarantine %",
    ]);
    for domain in &summary.domains {
        table.add_row(summary_row(domain.domain.code(), &domain.counts));
    }
    table.add_row(summary_row("ALL", &summary.overall));
    table
}

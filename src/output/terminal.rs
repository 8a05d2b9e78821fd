// Colored terminal output for run summaries and table status.

use colored::Colorize;

use crate::pipeline::rows::TableReport;
use crate::pipeline::run::RunSummary;

/// Display a per-table summary of a finished run.
pub fn display_run_summary(summary: &RunSummary) {
    println!("\n{}", "=== Sentiment Run ===".bold());
    println!(
        "  {}",
        format!(
            "{} -> {}",
            summary.started_at.format("%Y-%m-%d %H:%M:%S"),
            summary.finished_at.format("%H:%M:%S")
        )
        .dimmed()
    );
    println!();

    println!(
        "  {:<24} {:>8} {:>8} {:>8} {:>8}",
        "Table".dimmed(),
        "Selected".dimmed(),
        "Updated".dimmed(),
        "Skipped".dimmed(),
        "Failed".dimmed(),
    );
    println!("  {}", "-".repeat(60).dimmed());

    for report in &summary.tables {
        display_report_line(report);
    }

    println!();
    let failed = summary.total_failed();
    if failed > 0 {
        println!(
            "  {} {} rows could not be scored (scoring service errors)",
            "!".yellow().bold(),
            failed
        );
    }
    let missing = summary.total_missing();
    if missing > 0 {
        println!(
            "  {} {} scored rows no longer existed when their score was written",
            "!".yellow().bold(),
            missing
        );
    }
    println!("  {} rows updated", summary.total_updated().to_string().bold());
}

fn display_report_line(report: &TableReport) {
    let failed = if report.failed > 0 {
        report.failed.to_string().yellow()
    } else {
        report.failed.to_string().normal()
    };
    println!(
        "  {:<24} {:>8} {:>8} {:>8} {:>8}",
        report.table, report.selected, report.updated, report.skipped, failed,
    );
}

/// Display the eligible-row count for one table.
pub fn display_table_status(table: &str, predicate: &str, count: Option<i64>) {
    match count {
        Some(n) => println!("  {:<24} {:>8}  {}", table, n, predicate.dimmed()),
        None => println!("  {:<24} {:>8}  {}", table, "?".red(), "table unavailable".red()),
    }
}

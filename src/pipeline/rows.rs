// Row processing: score every eligible row of one table and write it back.
//
// Rows are fetched in full, filtered through the per-layout eligibility
// rules, then scored one at a time. A scoring failure skips only that row;
// a datastore failure aborts the table (and with it the run).

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::models::TableSpec;
use crate::db::Database;
use crate::error::{Result, ScoringError};
use crate::sentiment::aggregate::ScoreAggregator;

/// Outcome counts for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    /// Rows the selection predicate returned.
    pub selected: usize,
    /// Selected rows dropped for blank text or keyword.
    pub skipped: usize,
    /// Rows whose score was written.
    pub updated: usize,
    /// Rows that were scored but matched nothing at update time.
    pub missing: usize,
    /// Rows left untouched because the scoring service failed.
    pub failed: usize,
}

/// Score and persist every eligible row of `table`.
///
/// Text tables score `text`; the title+body table scores the title and,
/// when the body is non-blank, averages it with the body score.
pub async fn process_table(
    db: &dyn Database,
    aggregator: &ScoreAggregator<'_>,
    table: &TableSpec,
) -> Result<TableReport> {
    let rows = db
        .fetch_eligible(table)
        .await
        .map_err(ScoringError::connection)?;

    let selected = rows.len();
    let items = rows.into_items();
    let mut report = TableReport {
        table: table.name.clone(),
        selected,
        skipped: selected - items.len(),
        ..TableReport::default()
    };

    info!(
        table = %table.name,
        selected,
        eligible = items.len(),
        "Scanning table for unscored rows"
    );

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {msg} [{bar:30}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(table.name.clone());

    for item in &items {
        match aggregator.score_item(item).await {
            Ok(score) => {
                info!(
                    table = %table.name,
                    id = %item.id,
                    keyword = %item.keyword,
                    score,
                    "Updating sentiment score"
                );
                let affected = db
                    .update_sentiment_score(table, &item.id, score)
                    .await
                    .map_err(ScoringError::connection)?;
                if affected == 0 {
                    warn!(
                        table = %table.name,
                        id = %item.id,
                        "Row disappeared before its score could be written"
                    );
                    report.missing += 1;
                } else {
                    if affected > 1 {
                        warn!(
                            table = %table.name,
                            id = %item.id,
                            affected,
                            "Expected exactly one row to be updated"
                        );
                    }
                    report.updated += 1;
                }
            }
            Err(e) => {
                warn!(
                    table = %table.name,
                    id = %item.id,
                    error = %e,
                    "Error calling sentiment analysis API, skipping row"
                );
                report.failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(report)
}

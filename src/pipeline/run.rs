// Full scoring run over every configured table.
//
// Generic text tables go first in their configured order, then the
// title+body table. Any datastore failure ends the run; scoring failures
// were already absorbed per row by process_table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::rows::{process_table, TableReport};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::sentiment::aggregate::ScoreAggregator;
use crate::sentiment::traits::SentimentScorer;

/// What a run did, table by table.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<TableReport>,
}

impl RunSummary {
    pub fn total_updated(&self) -> usize {
        self.tables.iter().map(|t| t.updated).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.tables.iter().map(|t| t.failed).sum()
    }

    pub fn total_missing(&self) -> usize {
        self.tables.iter().map(|t| t.missing).sum()
    }
}

/// Run the scoring pipeline over every configured table.
pub async fn run(
    db: &dyn Database,
    scorer: &dyn SentimentScorer,
    config: &Config,
) -> Result<RunSummary> {
    let tables = config.tables()?;
    let aggregator = ScoreAggregator::new(scorer, config.aggregation);
    let started_at = Utc::now();

    info!(
        tables = tables.len(),
        samples = config.aggregation.samples,
        abort_on_invalid_sample = config.aggregation.abort_on_invalid_sample,
        "Starting sentiment run"
    );

    let mut reports = Vec::with_capacity(tables.len());
    for table in &tables {
        let report = process_table(db, &aggregator, table)
            .await
            .inspect_err(|e| error!(table = %table.name, error = %e, "Table scan failed, aborting run"))?;
        info!(
            table = %report.table,
            updated = report.updated,
            failed = report.failed,
            missing = report.missing,
            skipped = report.skipped,
            "Table complete"
        );
        reports.push(report);
    }

    Ok(RunSummary {
        started_at,
        finished_at: Utc::now(),
        tables: reports,
    })
}

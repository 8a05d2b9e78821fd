// System status display: how many rows each configured table would score.

use anyhow::Result;
use tracing::warn;

use crate::config::Config;
use crate::db::Database;
use crate::output::terminal::display_table_status;

/// Display eligible-row counts per table to the terminal.
///
/// A table that can't be counted is reported, not treated as fatal.
pub async fn show(db: &dyn Database, config: &Config) -> Result<()> {
    if config.uses_postgres() {
        println!("Database: PostgreSQL (DATABASE_URL)");
    } else {
        println!("Database: {}", config.db_path);
    }

    if config.llm_url.is_empty() {
        println!("Scoring endpoint: not configured");
    } else {
        println!("Scoring endpoint: {}", config.llm_url);
    }
    println!(
        "Samples per item: {} (abort on invalid sample: {})",
        config.aggregation.samples, config.aggregation.abort_on_invalid_sample
    );

    println!("\nEligible rows:");
    for table in config.tables()? {
        let predicate = table.kind.eligibility().sql_predicate();
        match db.count_eligible(&table).await {
            Ok(count) => display_table_status(&table.name, predicate, Some(count)),
            Err(e) => {
                warn!(table = %table.name, error = %e, "Failed to count eligible rows");
                display_table_status(&table.name, predicate, None);
            }
        }
    }

    Ok(())
}

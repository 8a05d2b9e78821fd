// Database trait: backend-agnostic async interface for the scoring pipeline.
//
// Implementors: SqliteDatabase (wraps rusqlite), PgDatabase (wraps sqlx).
// All methods are async so both sync (rusqlite via Mutex) and native async
// (sqlx) backends fit behind a single interface.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{FetchedRows, TableSpec};

#[async_trait]
pub trait Database: Send + Sync {
    /// Read every row the table's eligibility predicate selects.
    ///
    /// Rows are returned in full before any scoring starts, so no statement
    /// stays open across scoring calls.
    async fn fetch_eligible(&self, table: &TableSpec) -> Result<FetchedRows>;

    /// Count the rows the table's eligibility predicate would select.
    async fn count_eligible(&self, table: &TableSpec) -> Result<i64>;

    /// `UPDATE <table> SET sentiment_score = ? WHERE id = ?`.
    /// Returns the number of rows affected.
    async fn update_sentiment_score(&self, table: &TableSpec, id: &str, score: i32) -> Result<u64>;
}

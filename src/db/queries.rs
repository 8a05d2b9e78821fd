// Database queries: SQLite reads and writes for the scored tables.
//
// Every SQLite interaction goes through this module. SqliteDatabase wraps
// these free functions behind the Database trait; tests call them directly
// against an in-memory Connection.

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

use super::models::{FetchedRows, TableKind, TableSpec, TextRow, TitleBodyRow};

/// Read all eligible rows of a table.
pub fn fetch_eligible(conn: &Connection, table: &TableSpec) -> Result<FetchedRows> {
    let sql = super::select_eligible_sql(table, "id");
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("Failed to prepare selection on {}", table.name))?;

    let rows = match table.kind {
        TableKind::Text => FetchedRows::Text(
            stmt.query_map([], text_row)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .with_context(|| format!("Failed to read rows from {}", table.name))?,
        ),
        TableKind::TitleBody => FetchedRows::TitleBody(
            stmt.query_map([], title_body_row)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .with_context(|| format!("Failed to read rows from {}", table.name))?,
        ),
    };

    Ok(rows)
}

/// Count the rows the eligibility predicate selects.
pub fn count_eligible(conn: &Connection, table: &TableSpec) -> Result<i64> {
    let count = conn
        .query_row(&super::count_eligible_sql(table), [], |row| row.get(0))
        .with_context(|| format!("Failed to count eligible rows in {}", table.name))?;
    Ok(count)
}

/// Persist a score for one row. Returns the number of rows changed.
pub fn update_sentiment_score(
    conn: &Connection,
    table: &TableSpec,
    id: &str,
    score: i32,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {} SET sentiment_score = ?1 WHERE id = ?2",
        table.name
    );
    let affected = conn
        .execute(&sql, params![score, id])
        .with_context(|| format!("Failed to update sentiment score in {} for id {}", table.name, id))?;
    Ok(affected)
}

fn text_row(row: &Row<'_>) -> rusqlite::Result<TextRow> {
    Ok(TextRow {
        id: id_to_string(row.get(0)?),
        text: row.get(1)?,
        keyword: row.get(2)?,
    })
}

fn title_body_row(row: &Row<'_>) -> rusqlite::Result<TitleBodyRow> {
    Ok(TitleBodyRow {
        id: id_to_string(row.get(0)?),
        title: row.get(1)?,
        text: row.get(2)?,
        keyword: row.get(3)?,
    })
}

/// Ids are handled as text whatever the column's storage class.
fn id_to_string(value: Value) -> String {
    match value {
        Value::Text(s) => s,
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
        Value::Null => String::new(),
    }
}

// Database schema: creates the scored tables for a local SQLite database.
//
// In production these tables belong to the collectors that fill them; `init`
// only exists so a fresh SQLite file has the layout the pipeline reads.

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::models::{TableKind, TableSpec};

/// Create every configured table if it doesn't exist yet.
///
/// Idempotent, so it can run on every startup.
pub fn create_tables(conn: &Connection, tables: &[TableSpec]) -> Result<()> {
    for table in tables {
        conn.execute_batch(&table_ddl(table))
            .with_context(|| format!("Failed to create table {}", table.name))?;
    }
    Ok(())
}

fn table_ddl(table: &TableSpec) -> String {
    let title_column = match table.kind {
        TableKind::Text => "",
        TableKind::TitleBody => "title TEXT,\n            ",
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {name} (
            id TEXT PRIMARY KEY,
            {title_column}text TEXT,
            keyword TEXT,
            sentiment_score INTEGER
        );

        -- Index for the eligibility scan
        CREATE INDEX IF NOT EXISTS idx_{name}_sentiment
            ON {name}(sentiment_score);",
        name = table.name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_tables() -> Vec<TableSpec> {
        vec![
            TableSpec::new("x_posts", TableKind::Text).unwrap(),
            TableSpec::new("instagram_posts", TableKind::Text).unwrap(),
            TableSpec::new("youtube_comments", TableKind::Text).unwrap(),
            TableSpec::new("reddit_posts", TableKind::TitleBody).unwrap(),
        ]
    }

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        // Running create_tables twice should not error
        create_tables(&conn, &default_tables()).unwrap();
        create_tables(&conn, &default_tables()).unwrap();
    }

    #[test]
    fn test_title_body_table_has_title_column() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn, &default_tables()).unwrap();
        conn.execute(
            "INSERT INTO reddit_posts (id, title, text, keyword) VALUES ('1', 't', 'b', 'k')",
            [],
        )
        .unwrap();
        // Generic tables have no title column
        assert!(conn
            .execute(
                "INSERT INTO x_posts (id, title, text, keyword) VALUES ('1', 't', 'b', 'k')",
                [],
            )
            .is_err());
    }
}

// Database layer: reads unscored rows and writes sentiment scores back.
//
// SQLite (rusqlite, "bundled") is the default backend; the database file
// lives wherever SENTIMENT_DB_PATH points. PostgreSQL is available behind
// the `postgres` feature and is selected when DATABASE_URL is a postgres URL.
//
// Table names are interpolated into SQL. They only ever come from TableSpec,
// which validates them as plain identifiers.

pub mod models;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use traits::Database;

use std::sync::Arc;

use anyhow::Result;
#[cfg(feature = "sqlite")]
use anyhow::Context;
#[cfg(feature = "sqlite")]
use rusqlite::Connection;
#[cfg(feature = "sqlite")]
use std::path::Path;

use crate::config::Config;
use models::{TableKind, TableSpec};

/// SELECT for a table's eligible rows. `id_expr` lets a backend coerce the id
/// column to text (e.g. `id::text` on Postgres).
pub fn select_eligible_sql(table: &TableSpec, id_expr: &str) -> String {
    let columns = match table.kind {
        TableKind::Text => "text, keyword",
        TableKind::TitleBody => "title, text, keyword",
    };
    format!(
        "SELECT {id_expr} AS id, {columns} FROM {} WHERE {}",
        table.name,
        table.kind.eligibility().sql_predicate()
    )
}

/// COUNT(*) over a table's eligible rows.
pub fn count_eligible_sql(table: &TableSpec) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        table.name,
        table.kind.eligibility().sql_predicate()
    )
}

/// Open the configured backend.
///
/// Postgres when DATABASE_URL is a postgres URL, otherwise the SQLite file
/// (which must already exist, see `initialize_sqlite`).
pub async fn open(config: &Config) -> Result<Arc<dyn Database>> {
    if config.uses_postgres() {
        #[cfg(feature = "postgres")]
        {
            let url = config.database_url.as_deref().unwrap_or_default();
            tracing::info!("Using PostgreSQL backend");
            return connect_postgres(
                url,
                config.database_user.as_deref(),
                config.database_password.as_deref(),
            )
            .await;
        }
        #[cfg(not(feature = "postgres"))]
        anyhow::bail!(
            "DATABASE_URL points to PostgreSQL but the 'postgres' feature is not compiled in.\n\
             Rebuild with: cargo build --features postgres"
        );
    }

    #[cfg(feature = "sqlite")]
    {
        open_sqlite(&config.db_path)
    }
    #[cfg(not(feature = "sqlite"))]
    {
        anyhow::bail!("No database backend available: set DATABASE_URL to a postgres:// URL")
    }
}

/// Open (or create) the SQLite database and create the configured tables.
#[cfg(feature = "sqlite")]
pub fn initialize_sqlite(db_path: &str, tables: &[TableSpec]) -> Result<Arc<dyn Database>> {
    // Create parent directories if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn, tables)?;

    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}

/// Open an existing SQLite database (fails if it doesn't exist yet).
#[cfg(feature = "sqlite")]
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `sentiment-sweep init` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}

/// Connect to PostgreSQL. Explicit user/password override the URL's.
#[cfg(feature = "postgres")]
pub async fn connect_postgres(
    url: &str,
    user: Option<&str>,
    password: Option<&str>,
) -> Result<Arc<dyn Database>> {
    let db = postgres::PgDatabase::connect(url, user, password).await?;
    Ok(Arc::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_text_table() {
        let table = TableSpec::new("x_posts", TableKind::Text).unwrap();
        assert_eq!(
            select_eligible_sql(&table, "id"),
            "SELECT id AS id, text, keyword FROM x_posts \
             WHERE sentiment_score IS NULL OR sentiment_score = 0"
        );
    }

    #[test]
    fn test_select_sql_title_body_table() {
        let table = TableSpec::new("reddit_posts", TableKind::TitleBody).unwrap();
        assert_eq!(
            select_eligible_sql(&table, "id::text"),
            "SELECT id::text AS id, title, text, keyword FROM reddit_posts \
             WHERE sentiment_score IS NULL OR sentiment_score != -1"
        );
    }

    #[test]
    fn test_count_sql() {
        let table = TableSpec::new("youtube_comments", TableKind::Text).unwrap();
        assert_eq!(
            count_eligible_sql(&table),
            "SELECT COUNT(*) FROM youtube_comments \
             WHERE sentiment_score IS NULL OR sentiment_score = 0"
        );
    }
}

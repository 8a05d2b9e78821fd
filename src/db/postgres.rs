// PgDatabase: PostgreSQL backend implementing the Database trait.
//
// Uses sqlx PgPool for native async queries. All queries use runtime
// parameter binding (not compile-time macros) to avoid requiring
// DATABASE_URL at compile time.
//
// Key differences from SQLite:
// - $1/$2 parameter syntax
// - ids are selected as `id::text` so integer and text keys both work; the
//   UPDATE casts the bound text back to the column's own type so the
//   primary-key index is still used
// - the schema is owned by whoever fills the tables; no migrations run here

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx_core::pool::Pool;
use sqlx_core::row::Row;
use sqlx_postgres::{PgConnectOptions, PgRow, Postgres};
use tokio::sync::Mutex;

use super::models::{FetchedRows, TableKind, TableSpec, TextRow, TitleBodyRow};
use super::traits::Database;

/// Type alias for the PostgreSQL connection pool.
pub type PgPool = Pool<Postgres>;

pub struct PgDatabase {
    pool: PgPool,
    /// SQL type of each table's `id` column, looked up once per table.
    id_types: Mutex<HashMap<String, String>>,
}

impl PgDatabase {
    /// Connect to PostgreSQL.
    ///
    /// `user` and `password`, when given, replace the credentials in `url`.
    /// The URL is never echoed in errors since it may carry a password.
    pub async fn connect(url: &str, user: Option<&str>, password: Option<&str>) -> Result<Self> {
        let mut options: PgConnectOptions = url.parse().context("Invalid DATABASE_URL")?;
        if let Some(user) = user {
            options = options.username(user);
        }
        if let Some(password) = password {
            options = options.password(password);
        }

        let pool = PgPool::connect_with(options)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self {
            pool,
            id_types: Mutex::new(HashMap::new()),
        })
    }

    /// The declared type of `table.id`, e.g. `bigint` or `uuid`.
    async fn id_type(&self, table: &TableSpec) -> Result<String> {
        let mut cache = self.id_types.lock().await;
        if let Some(id_type) = cache.get(&table.name) {
            return Ok(id_type.clone());
        }

        let row = sqlx_core::query::query(
            "SELECT format_type(a.atttypid, a.atttypmod)
             FROM pg_attribute a
             WHERE a.attrelid = $1::regclass AND a.attname = 'id' AND NOT a.attisdropped",
        )
        .bind(table.name.as_str())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to look up the id column type of {}", table.name))?;
        let id_type: String = row.try_get(0)?;

        cache.insert(table.name.clone(), id_type.clone());
        Ok(id_type)
    }
}

/// UPDATE by id. The id is bound as text and cast to the column type, so the
/// comparison runs on the indexed column rather than on `id::text`.
fn update_sql(table: &TableSpec, id_type: &str) -> String {
    format!(
        "UPDATE {} SET sentiment_score = $1 WHERE id = $2::text::{}",
        table.name, id_type
    )
}

#[async_trait]
impl Database for PgDatabase {
    async fn fetch_eligible(&self, table: &TableSpec) -> Result<FetchedRows> {
        let sql = super::select_eligible_sql(table, "id::text");
        let rows = sqlx_core::query::query(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to select rows from {}", table.name))?;

        let fetched = match table.kind {
            TableKind::Text => FetchedRows::Text(
                rows.iter()
                    .map(text_row)
                    .collect::<Result<Vec<_>>>()?,
            ),
            TableKind::TitleBody => FetchedRows::TitleBody(
                rows.iter()
                    .map(title_body_row)
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        Ok(fetched)
    }

    async fn count_eligible(&self, table: &TableSpec) -> Result<i64> {
        let sql = super::count_eligible_sql(table);
        let row = sqlx_core::query::query(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count eligible rows in {}", table.name))?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn update_sentiment_score(&self, table: &TableSpec, id: &str, score: i32) -> Result<u64> {
        let sql = update_sql(table, &self.id_type(table).await?);
        let result = sqlx_core::query::query(&sql)
            .bind(score)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!("Failed to update sentiment score in {} for id {}", table.name, id)
            })?;
        Ok(result.rows_affected())
    }
}

fn text_row(row: &PgRow) -> Result<TextRow> {
    Ok(TextRow {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        keyword: row.try_get("keyword")?,
    })
}

fn title_body_row(row: &PgRow) -> Result<TitleBodyRow> {
    Ok(TitleBodyRow {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        keyword: row.try_get("keyword")?,
    })
}

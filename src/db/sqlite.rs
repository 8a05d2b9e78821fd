// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is Send
// but !Sync, and the trait requires a Sync handle.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across a scoring call: rows are fetched in full,
// then the lock is released before the pipeline talks to the network.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{FetchedRows, TableSpec};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn fetch_eligible(&self, table: &TableSpec) -> Result<FetchedRows> {
        let conn = self.conn.lock().await;
        super::queries::fetch_eligible(&conn, table)
    }

    async fn count_eligible(&self, table: &TableSpec) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_eligible(&conn, table)
    }

    async fn update_sentiment_score(&self, table: &TableSpec, id: &str, score: i32) -> Result<u64> {
        let conn = self.conn.lock().await;
        let affected = super::queries::update_sentiment_score(&conn, table, id, score)?;
        Ok(affected as u64)
    }
}

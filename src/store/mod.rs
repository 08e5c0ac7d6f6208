// src/store/mod.rs
//! Relational store: news articles and the search-keyword ledger.
//!
//! One SQLite pool is shared by the scheduler jobs and the request handlers;
//! every statement is its own short implicit transaction. The `UNIQUE`
//! constraint on `news_articles.url` is the authoritative dedup guarantee.

pub mod articles;
pub mod search_log;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

/// Schema applied at startup. `IF NOT EXISTS` keeps restarts idempotent.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS news_articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    published_at TEXT NOT NULL,
    source TEXT NOT NULL,
    click_count INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_news_articles_source ON news_articles(source, id DESC);
CREATE INDEX IF NOT EXISTS idx_news_articles_clicks ON news_articles(click_count DESC);

CREATE TABLE IF NOT EXISTS search_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL,
    searched_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_search_log_time ON search_log(searched_at);
"#;

/// Handle to the service database. Cheap to clone.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Connect to the SQLite database at `database_url`
    /// (e.g. `sqlite://data/insight.db`), creating the file if missing.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("parsing database url {database_url}"))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!(%database_url, "connecting to sqlite");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("opening sqlite pool")?;

        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection keeps the schema
    /// alive for the pool's lifetime.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("opening in-memory sqlite")?;
        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        info!("initializing database schema");
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .context("applying schema")?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

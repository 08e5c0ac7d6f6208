// src/store/search_log.rs
//! Append-only search-keyword ledger with a time-windowed top-N query.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::FromRow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::store::Db;

/// One aggregated row of the popularity query.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: i64,
}

impl Db {
    /// Append a searched keyword. If `ts_unix` is `None`, current time is
    /// used; tests pass explicit timestamps to probe the window boundary.
    pub async fn record_search(&self, keyword: &str, ts_unix: Option<u64>) -> Result<()> {
        let ts = ts_unix.unwrap_or_else(now_unix);
        sqlx::query("INSERT INTO search_log (keyword, searched_at) VALUES (?, ?)")
            .bind(keyword)
            .bind(ts as i64)
            .execute(self.pool())
            .await
            .with_context(|| format!("recording search for {keyword}"))?;
        Ok(())
    }

    /// Top searched keywords within the trailing `window`, grouped by exact
    /// keyword string, most frequent first. Ties resolve to first-insertion
    /// order so results are stable.
    pub async fn top_keywords(&self, window: Duration, limit: i64) -> Result<Vec<KeywordCount>> {
        let cutoff = now_unix().saturating_sub(window.as_secs());
        let rows = sqlx::query_as::<_, KeywordCount>(
            r#"
            SELECT keyword, COUNT(*) AS count
            FROM search_log
            WHERE searched_at >= ?
            GROUP BY keyword
            ORDER BY count DESC, MIN(id) ASC
            LIMIT ?
            "#,
        )
        .bind(cutoff as i64)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .context("aggregating top keywords")?;
        Ok(rows)
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

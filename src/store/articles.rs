// src/store/articles.rs
//! Article store: dedup-upsert keyed by url, newest-first listing, click
//! counts.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::FromRow;

use crate::fetch::FetchedArticle;
use crate::store::Db;

/// A persisted news article. `published_at` keeps the provider-supplied
/// string verbatim.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct NewsArticle {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: String,
    pub source: String,
    pub click_count: i64,
}

impl Db {
    /// Insert the given records under `source`, skipping any url already
    /// stored (first write wins; title/published_at are never refreshed).
    /// Returns the number of genuinely new rows — logging/metrics only,
    /// nothing downstream depends on it.
    ///
    /// Concurrent calls with overlapping urls are safe: the UNIQUE
    /// constraint turns a racing duplicate insert into a no-op.
    pub async fn upsert_articles(
        &self,
        records: &[FetchedArticle],
        source: &str,
    ) -> Result<u64> {
        let mut inserted = 0u64;
        for rec in records {
            let res = sqlx::query(
                r#"
                INSERT INTO news_articles (title, url, published_at, source, click_count)
                VALUES (?, ?, ?, ?, 0)
                ON CONFLICT(url) DO NOTHING
                "#,
            )
            .bind(&rec.title)
            .bind(&rec.url)
            .bind(&rec.published_at)
            .bind(source)
            .execute(self.pool())
            .await
            .with_context(|| format!("upserting article {}", rec.url))?;
            inserted += res.rows_affected();
        }
        Ok(inserted)
    }

    /// Articles for one source tag, newest first (by insertion id).
    pub async fn list_by_source(
        &self,
        source: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<NewsArticle>> {
        let rows = sqlx::query_as::<_, NewsArticle>(
            r#"
            SELECT id, title, url, published_at, source, click_count
            FROM news_articles
            WHERE source = ?
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(source)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .with_context(|| format!("listing articles for source {source}"))?;
        Ok(rows)
    }

    /// Atomic click increment. `None` means the id does not exist (a stale
    /// id from the client is a normal outcome, not an error).
    pub async fn increment_click(&self, article_id: i64) -> Result<Option<NewsArticle>> {
        let row = sqlx::query_as::<_, NewsArticle>(
            r#"
            UPDATE news_articles
            SET click_count = click_count + 1
            WHERE id = ?
            RETURNING id, title, url, published_at, source, click_count
            "#,
        )
        .bind(article_id)
        .fetch_optional(self.pool())
        .await
        .with_context(|| format!("incrementing click for article {article_id}"))?;
        Ok(row)
    }

    /// Most-clicked articles, ties broken by insertion order.
    pub async fn top_by_click(&self, limit: i64) -> Result<Vec<NewsArticle>> {
        let rows = sqlx::query_as::<_, NewsArticle>(
            r#"
            SELECT id, title, url, published_at, source, click_count
            FROM news_articles
            ORDER BY click_count DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .context("listing top articles by click")?;
        Ok(rows)
    }
}

// src/fetch/news.rs
//! News-search API client (DeepSearch-compatible).
//!
//! Three lookups: trending macro articles (fixed keyword), per-theme
//! articles, and the investment-theme tag list. Responses are normalized to
//! [`FetchedArticle`] before they leave this module.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::fetch::{normalize_title, FetchedArticle, NewsSource};

/// Keyword used for the macro-news feed; the provider has no dedicated
/// trending endpoint, so macro news is the articles search pinned to it.
const MACRO_KEYWORD: &str = "거시경제";

pub struct DeepSearchClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DeepSearchClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: crate::fetch::http_client(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    async fn try_articles(&self, keyword: &str, limit: usize) -> Result<Vec<FetchedArticle>> {
        let url = format!("{}/v1/articles", self.base_url);
        let page_size = limit.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("keyword", keyword),
                ("page_size", page_size.as_str()),
                ("order", "published_at"),
            ])
            .send()
            .await
            .context("news articles request")?
            .error_for_status()
            .context("news articles status")?;
        let body: ArticlesResp = resp.json().await.context("news articles body")?;
        Ok(normalize_articles(body))
    }

    async fn try_themes(&self) -> Result<Vec<String>> {
        let url = format!("{}/v2/markets/invest_tags", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("country_code", "kr"),
            ])
            .send()
            .await
            .context("themes request")?
            .error_for_status()
            .context("themes status")?;
        let body: ThemesResp = resp.json().await.context("themes body")?;
        Ok(body
            .data
            .into_iter()
            .map(|t| t.tag_name)
            .filter(|t| !t.is_empty())
            .collect())
    }
}

#[async_trait]
impl NewsSource for DeepSearchClient {
    async fn trending_macro_topics(&self, limit: usize) -> Option<Vec<FetchedArticle>> {
        self.articles_by_theme(MACRO_KEYWORD, limit).await
    }

    async fn articles_by_theme(&self, theme: &str, limit: usize) -> Option<Vec<FetchedArticle>> {
        match self.try_articles(theme, limit).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = ?e, provider = self.name(), theme, "news fetch failed");
                counter!("fetch_provider_errors_total", "provider" => self.name()).increment(1);
                None
            }
        }
    }

    async fn investment_themes(&self) -> Option<Vec<String>> {
        match self.try_themes().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = ?e, provider = self.name(), "theme list fetch failed");
                counter!("fetch_provider_errors_total", "provider" => self.name()).increment(1);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "deepsearch"
    }
}

// --- wire shapes ---

#[derive(Debug, Deserialize)]
struct ArticlesResp {
    #[serde(default)]
    data: Vec<ArticleItem>,
}

#[derive(Debug, Deserialize)]
struct ArticleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ThemesResp {
    #[serde(default)]
    data: Vec<ThemeItem>,
}

#[derive(Debug, Deserialize)]
struct ThemeItem {
    #[serde(default)]
    tag_name: String,
}

/// Map the provider shape to canonical records, dropping items without a url
/// (nothing to dedup on) and normalizing titles.
fn normalize_articles(body: ArticlesResp) -> Vec<FetchedArticle> {
    body.data
        .into_iter()
        .filter(|item| !item.url.is_empty())
        .map(|item| FetchedArticle {
            title: normalize_title(&item.title),
            url: item.url,
            published_at: item.published_at,
        })
        .collect()
}

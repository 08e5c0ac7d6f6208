// src/fetch/mod.rs
//! External fetchers: news search, stock quotes, macro indicators.
//!
//! Contract: every fetch returns either normalized records or `None` for
//! "no data this cycle". Transport and parse failures are logged and counted
//! here; callers never see provider-specific errors.

pub mod indicators;
pub mod news;
pub mod stock;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use indicators::FredClient;
pub use news::DeepSearchClient;
pub use stock::NaverQuoteClient;

/// Connection/request bounds applied to every external client so a slow
/// provider cannot stall a scheduled job past its next tick.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("stock-insight-service/0.1")
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("reqwest client")
}

/// A normalized article as it leaves a fetcher: canonical field names, no
/// provider-specific shape. `click_count` starts at zero on persist — the
/// provider has no concept of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchedArticle {
    pub title: String,
    pub url: String,
    /// Provider-supplied timestamp string, preserved verbatim.
    pub published_at: String,
}

/// Quote/valuation snapshot for one listed stock. The provider formats the
/// numbers; we pass them through. `market_cap`/`per`/`pbr` are missing for
/// some instruments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockDetail {
    pub code: String,
    pub name: String,
    pub price: String,
    pub market_cap: Option<String>,
    pub per: Option<String>,
    pub pbr: Option<String>,
}

/// Formatted macro indicator values from the economic-data provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroIndicators {
    pub interest_rate: String,
    pub gdp_growth: String,
}

/// News-search provider. `None` means "no data this cycle" — the failure has
/// already been logged and counted.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn trending_macro_topics(&self, limit: usize) -> Option<Vec<FetchedArticle>>;
    async fn articles_by_theme(&self, theme: &str, limit: usize) -> Option<Vec<FetchedArticle>>;
    async fn investment_themes(&self) -> Option<Vec<String>>;
    fn name(&self) -> &'static str;
}

/// Stock quote provider.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn stock_detail(&self, code: &str) -> Option<StockDetail>;
    fn name(&self) -> &'static str;
}

/// Macro indicator provider.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    async fn macro_indicators(&self) -> Option<MacroIndicators>;
    fn name(&self) -> &'static str;
}

/// Normalize a provider title: decode HTML entities, strip tags, collapse
/// whitespace, trim.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

// src/fetch/stock.rs
//! Stock quote client (Naver mobile integration endpoint).
//!
//! One call returns name, latest close, and the valuation table; the
//! valuation fields arrive as a code/value list and are missing for some
//! instruments (ETFs have no PER).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::fetch::{QuoteSource, StockDetail};

pub struct NaverQuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl NaverQuoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: crate::fetch::http_client(),
            base_url: base_url.into(),
        }
    }

    async fn try_detail(&self, code: &str) -> Result<StockDetail> {
        let url = format!("{}/api/stock/{}/integration", self.base_url, code);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("stock integration request")?
            .error_for_status()
            .context("stock integration status")?;
        let body: IntegrationResp = resp.json().await.context("stock integration body")?;
        detail_from_resp(code, body)
    }
}

#[async_trait]
impl QuoteSource for NaverQuoteClient {
    async fn stock_detail(&self, code: &str) -> Option<StockDetail> {
        match self.try_detail(code).await {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::warn!(error = ?e, provider = self.name(), code, "quote fetch failed");
                counter!("fetch_provider_errors_total", "provider" => self.name()).increment(1);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "naver"
    }
}

// --- wire shapes ---

#[derive(Debug, Deserialize)]
struct IntegrationResp {
    #[serde(rename = "stockName", default)]
    stock_name: String,
    #[serde(rename = "dealTrendInfos", default)]
    deal_trend_infos: Vec<DealTrend>,
    #[serde(rename = "totalInfos", default)]
    total_infos: Vec<TotalInfo>,
}

#[derive(Debug, Deserialize)]
struct DealTrend {
    #[serde(rename = "closePrice", default)]
    close_price: String,
}

#[derive(Debug, Deserialize)]
struct TotalInfo {
    #[serde(default)]
    code: String,
    #[serde(default)]
    value: Option<String>,
}

fn detail_from_resp(code: &str, body: IntegrationResp) -> Result<StockDetail> {
    if body.stock_name.is_empty() {
        return Err(anyhow!("stock name missing for {code}"));
    }
    let price = body
        .deal_trend_infos
        .first()
        .map(|d| d.close_price.clone())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow!("close price missing for {code}"))?;

    let find = |key: &str| {
        body.total_infos
            .iter()
            .find(|t| t.code == key)
            .and_then(|t| t.value.clone())
    };

    Ok(StockDetail {
        code: code.to_string(),
        name: body.stock_name,
        price,
        market_cap: find("marketValue"),
        per: find("per"),
        pbr: find("pbr"),
    })
}

// src/fetch/indicators.rs
//! Macro-indicator client (FRED observations API).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::fetch::{IndicatorSource, MacroIndicators};

/// Effective federal funds rate, daily.
const SERIES_INTEREST_RATE: &str = "DFF";
/// Real GDP growth, quarter over quarter, seasonally adjusted annual rate.
const SERIES_GDP_GROWTH: &str = "A191RL1Q225SBEA";

pub struct FredClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FredClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: crate::fetch::http_client(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Latest numeric observation of one series, formatted as "x.xx%".
    async fn try_latest(&self, series_id: &str) -> Result<String> {
        let url = format!("{}/fred/series/observations", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "desc"),
                ("limit", "10"),
            ])
            .send()
            .await
            .with_context(|| format!("fred request for {series_id}"))?
            .error_for_status()
            .with_context(|| format!("fred status for {series_id}"))?;
        let body: ObservationsResp = resp
            .json()
            .await
            .with_context(|| format!("fred body for {series_id}"))?;
        latest_value(&body)
            .ok_or_else(|| anyhow!("no numeric observation for {series_id}"))
    }
}

#[async_trait]
impl IndicatorSource for FredClient {
    async fn macro_indicators(&self) -> Option<MacroIndicators> {
        let fetch = async {
            let interest_rate = self.try_latest(SERIES_INTEREST_RATE).await?;
            let gdp_growth = self.try_latest(SERIES_GDP_GROWTH).await?;
            Ok::<_, anyhow::Error>(MacroIndicators {
                interest_rate,
                gdp_growth,
            })
        };
        match fetch.await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = ?e, provider = self.name(), "indicator fetch failed");
                counter!("fetch_provider_errors_total", "provider" => self.name()).increment(1);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "fred"
    }
}

// --- wire shapes ---

#[derive(Debug, Deserialize)]
struct ObservationsResp {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    #[serde(default)]
    value: String,
}

/// FRED publishes "." for missing data points; take the newest observation
/// that actually parses.
fn latest_value(body: &ObservationsResp) -> Option<String> {
    body.observations
        .iter()
        .find_map(|o| o.value.parse::<f64>().ok())
        .map(|v| format!("{v:.2}%"))
}

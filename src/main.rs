//! AI Financial Info Service — Binary Entrypoint
//! Boots the Axum HTTP server and the background refresh jobs, wiring the
//! store, the indicator cache, and the insight pipeline.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stock_insight_service::api::{self, AppState};
use stock_insight_service::config::{load_main_themes_default, Settings};
use stock_insight_service::fetch::{
    DeepSearchClient, FredClient, IndicatorSource, NaverQuoteClient, NewsSource, QuoteSource,
};
use stock_insight_service::indicators::IndicatorHandle;
use stock_insight_service::insight::llm::OpenAiChat;
use stock_insight_service::insight::reports::ReportStore;
use stock_insight_service::insight::InsightPipeline;
use stock_insight_service::jobs::{build_jobs, JobContext, JobSchedule};
use stock_insight_service::metrics::Metrics;
use stock_insight_service::scheduler::spawn_jobs;
use stock_insight_service::store::Db;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env();
    let metrics = Metrics::init();

    let db = Db::connect(&settings.database_url).await?;
    db.init_schema().await?;

    let news: Arc<dyn NewsSource> = Arc::new(DeepSearchClient::new(
        settings.deepsearch_api_key.clone(),
        settings.deepsearch_base_url.clone(),
    ));
    let quotes: Arc<dyn QuoteSource> =
        Arc::new(NaverQuoteClient::new(settings.quote_base_url.clone()));
    let indicator_api: Arc<dyn IndicatorSource> = Arc::new(FredClient::new(
        settings.fred_api_key.clone(),
        settings.fred_base_url.clone(),
    ));

    let indicators = IndicatorHandle::default();
    let main_themes = Arc::new(load_main_themes_default());

    let insight = Arc::new(InsightPipeline::new(
        Arc::new(OpenAiChat::new(
            settings.quick_model_api_key.clone(),
            settings.quick_model_base_url.clone(),
            settings.quick_model.clone(),
            64,
            0.1,
        )),
        Arc::new(OpenAiChat::new(
            settings.report_model_api_key.clone(),
            settings.report_model_base_url.clone(),
            settings.report_model.clone(),
            1024,
            0.3,
        )),
        ReportStore::new(&settings.reports_dir),
        indicators.clone(),
    ));

    // Background refresh jobs: each also runs once now (cold-start population).
    let _job_handles = spawn_jobs(build_jobs(
        JobContext {
            db: db.clone(),
            news: news.clone(),
            indicator_api,
            indicators,
            main_themes: main_themes.clone(),
        },
        JobSchedule {
            macro_interval: settings.macro_interval,
            theme_interval: settings.theme_interval,
            indicator_hour_utc: settings.indicator_hour_utc,
        },
    ));

    let state = AppState {
        db,
        news,
        quotes,
        insight,
        main_themes,
    };
    let app = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    tracing::info!(addr = %settings.bind_addr, "listening");
    axum::serve(listener, app).await.context("serving http")?;

    Ok(())
}

// src/jobs.rs
//! The three concrete refresh jobs driven by the scheduler: macro news,
//! themed news, and the daily indicator snapshot.
//!
//! Failures here never cancel future runs — a fetch that returns no data is
//! logged and the next tick retries naturally.

use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::fetch::{IndicatorSource, NewsSource};
use crate::indicators::IndicatorHandle;
use crate::scheduler::{Job, Trigger};
use crate::store::Db;

/// Source tag for the macro feed; themed articles are tagged by theme name.
pub const SOURCE_MACRO: &str = "macro";
/// Articles requested per feed per tick.
pub const FETCH_LIMIT: usize = 10;
/// News keyword backing the trade-policy headline of the indicator snapshot.
const TRADE_KEYWORD: &str = "무역 정책";

/// Everything the refresh jobs share. Cheap to clone into job closures.
#[derive(Clone)]
pub struct JobContext {
    pub db: Db,
    pub news: Arc<dyn NewsSource>,
    pub indicator_api: Arc<dyn IndicatorSource>,
    pub indicators: IndicatorHandle,
    pub main_themes: Arc<Vec<String>>,
}

/// Trigger timing for [`build_jobs`]. The themed interval is offset from the
/// macro one so the two jobs do not hit the provider simultaneously.
#[derive(Debug, Clone, Copy)]
pub struct JobSchedule {
    pub macro_interval: Duration,
    pub theme_interval: Duration,
    pub indicator_hour_utc: u32,
}

/// Fetch trending macro articles and upsert them under the "macro" tag.
pub async fn refresh_macro_news(ctx: &JobContext) {
    match ctx.news.trending_macro_topics(FETCH_LIMIT).await {
        Some(articles) if !articles.is_empty() => {
            match ctx.db.upsert_articles(&articles, SOURCE_MACRO).await {
                Ok(inserted) => {
                    counter!("news_articles_inserted_total", "source" => SOURCE_MACRO)
                        .increment(inserted);
                    info!(fetched = articles.len(), inserted, "macro news refreshed");
                }
                Err(e) => warn!(error = ?e, "macro news persist failed"),
            }
        }
        _ => info!("no macro news this cycle"),
    }
}

/// Fetch articles for each configured main theme and upsert them under that
/// theme. One failing theme does not stop the others.
pub async fn refresh_themed_news(ctx: &JobContext) {
    for theme in ctx.main_themes.iter() {
        match ctx.news.articles_by_theme(theme, FETCH_LIMIT).await {
            Some(articles) if !articles.is_empty() => {
                match ctx.db.upsert_articles(&articles, theme).await {
                    Ok(inserted) => {
                        counter!("news_articles_inserted_total", "source" => theme.clone())
                            .increment(inserted);
                        info!(%theme, fetched = articles.len(), inserted, "theme news refreshed");
                    }
                    Err(e) => warn!(error = ?e, %theme, "theme news persist failed"),
                }
            }
            _ => info!(%theme, "no theme news this cycle"),
        }
    }
}

/// Rebuild the indicator snapshot: macro figures from the economic-data
/// provider, trade headline from the news provider. Fields that fail to
/// fetch keep their previous value; the swap is a single complete snapshot.
pub async fn refresh_indicators(ctx: &JobContext) {
    let mut next = (*ctx.indicators.snapshot()).clone();
    let mut changed = false;

    if let Some(m) = ctx.indicator_api.macro_indicators().await {
        next.interest_rate = Some(m.interest_rate);
        next.gdp_growth = Some(m.gdp_growth);
        changed = true;
    }

    if let Some(articles) = ctx.news.articles_by_theme(TRADE_KEYWORD, 1).await {
        if let Some(first) = articles.into_iter().next() {
            next.trade_headline = Some(first.title);
            changed = true;
        }
    }

    if changed {
        ctx.indicators.replace(next);
        info!("indicator snapshot refreshed");
    } else {
        warn!("indicator refresh produced no data; keeping previous snapshot");
    }
}

/// Assemble the job table. All three jobs also run once at startup via the
/// scheduler's immediate first tick.
pub fn build_jobs(ctx: JobContext, schedule: JobSchedule) -> Vec<Job> {
    let macro_ctx = ctx.clone();
    let theme_ctx = ctx.clone();
    let indicator_ctx = ctx;

    vec![
        Job::new(
            "macro-news",
            Trigger::Every(schedule.macro_interval),
            move || {
                let ctx = macro_ctx.clone();
                async move { refresh_macro_news(&ctx).await }
            },
        ),
        Job::new(
            "themed-news",
            Trigger::Every(schedule.theme_interval),
            move || {
                let ctx = theme_ctx.clone();
                async move { refresh_themed_news(&ctx).await }
            },
        ),
        Job::new(
            "indicators",
            Trigger::DailyAt {
                hour: schedule.indicator_hour_utc,
                minute: 0,
            },
            move || {
                let ctx = indicator_ctx.clone();
                async move { refresh_indicators(&ctx).await }
            },
        ),
    ]
}

// src/api.rs
//! HTTP surface consumed by the web front-end. Thin shaping layer over the
//! store, the indicator cache, and the insight pipeline; "not found" and
//! "provider unavailable" are normal JSON outcomes here, never faults.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::fetch::{NewsSource, QuoteSource, StockDetail};
use crate::insight::InsightPipeline;
use crate::store::articles::NewsArticle;
use crate::store::search_log::KeywordCount;
use crate::store::Db;

/// Served when the theme provider returns no data.
pub const FALLBACK_THEMES: [&str; 4] = ["반도체", "2차전지", "인공지능", "바이오/제약"];

const ARTICLE_PAGE_LIMIT: i64 = 5;
const TOP_CLICK_LIMIT: i64 = 10;
const TOP_KEYWORD_LIMIT: i64 = 10;
/// Popularity window of the top-searched query.
const SEARCH_WINDOW: Duration = Duration::from_secs(24 * 3600);

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub news: Arc<dyn NewsSource>,
    pub quotes: Arc<dyn QuoteSource>,
    pub insight: Arc<InsightPipeline>,
    pub main_themes: Arc<Vec<String>>,
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "OK" }))
        .route("/api/news/macro", get(macro_news))
        .route("/api/news/popular", get(popular_news))
        .route("/api/news/theme/{theme}", get(theme_news))
        .route("/api/news/{id}/click", post(click_article))
        .route("/api/themes", get(themes))
        .route("/api/stock/search/{code}", get(stock_search))
        .route("/api/stocks/top-searched", get(top_searched))
        .route("/api/insight/{code}", get(insight))
        .route("/api/chatbot", post(chatbot))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "AI 금융 정보 서버에 오신 것을 환영합니다!" }))
}

async fn macro_news(State(state): State<AppState>) -> ApiResult<Vec<NewsArticle>> {
    let articles = state
        .db
        .list_by_source(crate::jobs::SOURCE_MACRO, 0, ARTICLE_PAGE_LIMIT)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

async fn popular_news(State(state): State<AppState>) -> ApiResult<Vec<NewsArticle>> {
    let articles = state.db.top_by_click(TOP_CLICK_LIMIT).await.map_err(internal)?;
    Ok(Json(articles))
}

/// Main themes are served straight from the refreshed store. Any other theme
/// is fetched ad hoc, upserted under that theme (read-through), and then
/// served from the store so the response always carries ids and click counts.
async fn theme_news(
    State(state): State<AppState>,
    Path(theme): Path<String>,
) -> ApiResult<Vec<NewsArticle>> {
    if !state.main_themes.contains(&theme) {
        match state
            .news
            .articles_by_theme(&theme, ARTICLE_PAGE_LIMIT as usize)
            .await
        {
            Some(fetched) => {
                state
                    .db
                    .upsert_articles(&fetched, &theme)
                    .await
                    .map_err(internal)?;
            }
            None => return Err(not_found("해당 테마의 기사를 가져올 수 없습니다.")),
        }
    }
    let articles = state
        .db
        .list_by_source(&theme, 0, ARTICLE_PAGE_LIMIT)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

async fn click_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<NewsArticle> {
    match state.db.increment_click(id).await.map_err(internal)? {
        Some(article) => Ok(Json(article)),
        None => Err(not_found("기사를 찾을 수 없습니다.")),
    }
}

async fn themes(State(state): State<AppState>) -> Json<Vec<String>> {
    match state.news.investment_themes().await {
        Some(themes) => Json(themes),
        None => Json(FALLBACK_THEMES.iter().map(|s| s.to_string()).collect()),
    }
}

async fn stock_search(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<StockDetail> {
    let Some(detail) = state.quotes.stock_detail(&code).await else {
        return Err(not_found("종목 정보를 가져올 수 없습니다."));
    };
    // The resolved name is the keyword the popularity ledger aggregates on.
    state
        .db
        .record_search(&detail.name, None)
        .await
        .map_err(internal)?;
    Ok(Json(detail))
}

async fn top_searched(State(state): State<AppState>) -> ApiResult<Vec<KeywordCount>> {
    let top = state
        .db
        .top_keywords(SEARCH_WINDOW, TOP_KEYWORD_LIMIT)
        .await
        .map_err(internal)?;
    Ok(Json(top))
}

#[derive(serde::Serialize)]
struct InsightResp {
    stock_name: String,
    conclusion: String,
    reason: String,
    report_id: String,
}

async fn insight(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<InsightResp> {
    let Some(stock) = state.quotes.stock_detail(&code).await else {
        return Err(not_found("종목을 찾을 수 없습니다."));
    };

    let outcome = state
        .insight
        .create_insight(&stock.name)
        .await
        .map_err(internal)?;

    Ok(Json(InsightResp {
        stock_name: outcome.stock_name,
        conclusion: outcome.opinion.value.stance.label_ko().to_string(),
        reason: outcome.opinion.value.reason,
        report_id: outcome.report_id,
    }))
}

#[derive(serde::Deserialize)]
struct ChatbotReq {
    report_id: String,
    question: String,
}

#[derive(serde::Serialize)]
struct ChatbotResp {
    answer: String,
}

async fn chatbot(
    State(state): State<AppState>,
    Json(body): Json<ChatbotReq>,
) -> Json<ChatbotResp> {
    // Degradation collapses to the placeholder string exactly here.
    let answer = state
        .insight
        .answer_question(&body.report_id, &body.question)
        .await;
    Json(ChatbotResp {
        answer: answer.value,
    })
}

fn not_found(detail: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail })))
}

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!(error = ?e, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "내부 오류가 발생했습니다." })),
    )
}

// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/themes        (provider list vs. fixed fallback)
// - GET /api/news/macro    (store-backed shape)
// - GET /api/news/theme/…  (read-through for non-main themes, 404 on no data)
// - POST /api/news/{id}/click
// - GET /api/stock/search/… + /api/stocks/top-searched
// - GET /api/insight/… + POST /api/chatbot round-trip

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use stock_insight_service::api::{self, AppState, FALLBACK_THEMES};
use stock_insight_service::fetch::{FetchedArticle, NewsSource, QuoteSource, StockDetail};
use stock_insight_service::indicators::IndicatorHandle;
use stock_insight_service::insight::llm::FixedChat;
use stock_insight_service::insight::reports::ReportStore;
use stock_insight_service::insight::{InsightPipeline, REPORT_NOT_FOUND};
use stock_insight_service::store::Db;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct MockNews {
    themes: Option<Vec<String>>,
    articles: Option<Vec<FetchedArticle>>,
}

#[async_trait]
impl NewsSource for MockNews {
    async fn trending_macro_topics(&self, _limit: usize) -> Option<Vec<FetchedArticle>> {
        self.articles.clone()
    }
    async fn articles_by_theme(&self, _theme: &str, _limit: usize) -> Option<Vec<FetchedArticle>> {
        self.articles.clone()
    }
    async fn investment_themes(&self) -> Option<Vec<String>> {
        self.themes.clone()
    }
    fn name(&self) -> &'static str {
        "mock-news"
    }
}

struct MockQuotes;

#[async_trait]
impl QuoteSource for MockQuotes {
    async fn stock_detail(&self, code: &str) -> Option<StockDetail> {
        (code == "005930").then(|| StockDetail {
            code: code.to_string(),
            name: "삼성전자".to_string(),
            price: "71,500".to_string(),
            market_cap: Some("427조".to_string()),
            per: Some("12.4배".to_string()),
            pbr: Some("1.1배".to_string()),
        })
    }
    fn name(&self) -> &'static str {
        "mock-quotes"
    }
}

async fn test_router_with(news: MockNews, reports_dir: &std::path::Path) -> (Router, Db) {
    let db = Db::connect_in_memory().await.unwrap();
    db.init_schema().await.unwrap();

    let insight = Arc::new(InsightPipeline::new(
        Arc::new(FixedChat("결론: 매수, 근거: 실적 개선".into())),
        Arc::new(FixedChat("반도체 업황 회복 보고서".into())),
        ReportStore::new(reports_dir),
        IndicatorHandle::default(),
    ));

    let state = AppState {
        db: db.clone(),
        news: Arc::new(news),
        quotes: Arc::new(MockQuotes),
        insight,
        main_themes: Arc::new(vec!["반도체".to_string()]),
    };
    (api::router(state), db)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let val = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, val)
}

async fn post_json(app: &Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let val = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, val)
}

fn sample_articles() -> Vec<FetchedArticle> {
    vec![FetchedArticle {
        title: "로봇 산업 투자 확대".into(),
        url: "https://news.example/robot-1".into(),
        published_at: "2025-07-01 09:00:00".into(),
    }]
}

#[tokio::test]
async fn health_returns_ok() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(std::str::from_utf8(&bytes).unwrap().trim(), "OK");
}

#[tokio::test]
async fn themes_fall_back_exactly_when_provider_has_no_data() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    let (status, val) = get_json(&app, "/api/themes").await;
    assert_eq!(status, StatusCode::OK);
    let got: Vec<String> = serde_json::from_value(val).unwrap();
    let expected: Vec<String> = FALLBACK_THEMES.iter().map(|s| s.to_string()).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn themes_pass_through_when_provider_answers() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _db) = test_router_with(
        MockNews {
            themes: Some(vec!["로봇".into(), "우주항공".into()]),
            articles: None,
        },
        tmp.path(),
    )
    .await;

    let (_, val) = get_json(&app, "/api/themes").await;
    let got: Vec<String> = serde_json::from_value(val).unwrap();
    assert_eq!(got, vec!["로봇".to_string(), "우주항공".to_string()]);
}

#[tokio::test]
async fn macro_news_serves_store_rows_with_full_shape() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    db.upsert_articles(
        &[FetchedArticle {
            title: "금리 동결".into(),
            url: "https://news.example/m1".into(),
            published_at: "2025-07-01 09:00:00".into(),
        }],
        "macro",
    )
    .await
    .unwrap();

    let (status, val) = get_json(&app, "/api/news/macro").await;
    assert_eq!(status, StatusCode::OK);
    let arr = val.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    let a = &arr[0];
    assert!(a["id"].is_i64());
    assert_eq!(a["title"], "금리 동결");
    assert_eq!(a["url"], "https://news.example/m1");
    assert_eq!(a["click_count"], 0);
}

#[tokio::test]
async fn adhoc_theme_is_read_through_and_served_from_the_store() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, db) = test_router_with(
        MockNews {
            themes: None,
            articles: Some(sample_articles()),
        },
        tmp.path(),
    )
    .await;

    let (status, val) = get_json(&app, "/api/news/theme/%EB%A1%9C%EB%B4%87").await; // "로봇"
    assert_eq!(status, StatusCode::OK);
    let arr = val.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert!(arr[0]["id"].is_i64());

    // The fetch was persisted under the requested theme.
    let rows = db.list_by_source("로봇", 0, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn adhoc_theme_404s_when_provider_has_no_data() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    let (status, val) = get_json(&app, "/api/news/theme/%EB%A1%9C%EB%B4%87").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(val["detail"].is_string());
}

#[tokio::test]
async fn click_increments_and_stale_id_is_404() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    db.upsert_articles(
        &[FetchedArticle {
            title: "a".into(),
            url: "https://news.example/c1".into(),
            published_at: "2025-07-01".into(),
        }],
        "macro",
    )
    .await
    .unwrap();
    let id = db.list_by_source("macro", 0, 1).await.unwrap()[0].id;

    let (status, val) = post_json(&app, &format!("/api/news/{id}/click"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(val["click_count"], 1);

    let (status, _) = post_json(&app, "/api/news/999999/click", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stock_search_logs_the_resolved_name() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    let (status, val) = get_json(&app, "/api/stock/search/005930").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(val["name"], "삼성전자");
    assert_eq!(val["price"], "71,500");

    let (_, top) = get_json(&app, "/api/stocks/top-searched").await;
    let arr = top.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["keyword"], "삼성전자");
    assert_eq!(arr[0]["count"], 1);

    // Unknown code: 404, and nothing is logged.
    let (status, _) = get_json(&app, "/api/stock/search/000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, top) = get_json(&app, "/api/stocks/top-searched").await;
    assert_eq!(top.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn insight_then_chatbot_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    let (status, val) = get_json(&app, "/api/insight/005930").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(val["stock_name"], "삼성전자");
    assert_eq!(val["conclusion"], "매수");
    assert_eq!(val["reason"], "실적 개선");
    let report_id = val["report_id"].as_str().unwrap().to_string();
    assert!(!report_id.is_empty());

    // Follow-up grounded in the just-persisted report.
    let (status, val) = post_json(
        &app,
        "/api/chatbot",
        json!({ "report_id": report_id, "question": "핵심 근거는?" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // FixedChat echoes its canned completion for any prompt.
    assert_eq!(val["answer"], "결론: 매수, 근거: 실적 개선");
}

#[tokio::test]
async fn chatbot_unknown_report_id_is_a_normal_reply() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    let (status, val) = post_json(
        &app,
        "/api/chatbot",
        json!({ "report_id": "00000000-0000-0000-0000-000000000000", "question": "요약" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(val["answer"], REPORT_NOT_FOUND);
}

#[tokio::test]
async fn insight_unknown_stock_is_404() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _db) = test_router_with(
        MockNews {
            themes: None,
            articles: None,
        },
        tmp.path(),
    )
    .await;

    let (status, _) = get_json(&app, "/api/insight/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

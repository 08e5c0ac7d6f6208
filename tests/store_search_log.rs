// tests/store_search_log.rs
//
// Windowing and ordering of the search-keyword popularity query.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use stock_insight_service::store::Db;

const DAY: Duration = Duration::from_secs(24 * 3600);

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

async fn fresh_db() -> Db {
    let db = Db::connect_in_memory().await.expect("in-memory db");
    db.init_schema().await.expect("schema");
    db
}

#[tokio::test]
async fn entries_older_than_the_window_are_excluded() {
    let db = fresh_db().await;
    let now = now_unix();

    db.record_search("삼성전자", Some(now - 25 * 3600)).await.unwrap(); // outside 24h
    db.record_search("삼성전자", Some(now - 3600)).await.unwrap();
    db.record_search("LG에너지솔루션", Some(now - 26 * 3600)).await.unwrap(); // only old

    let top = db.top_keywords(DAY, 10).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].keyword, "삼성전자");
    assert_eq!(top[0].count, 1);
}

#[tokio::test]
async fn counts_order_most_frequent_first() {
    let db = fresh_db().await;
    for _ in 0..3 {
        db.record_search("카카오", None).await.unwrap();
    }
    db.record_search("네이버", None).await.unwrap();
    db.record_search("네이버", None).await.unwrap();
    db.record_search("셀트리온", None).await.unwrap();

    let top = db.top_keywords(DAY, 10).await.unwrap();
    let pairs: Vec<(&str, i64)> = top.iter().map(|k| (k.keyword.as_str(), k.count)).collect();
    assert_eq!(pairs, vec![("카카오", 3), ("네이버", 2), ("셀트리온", 1)]);
}

#[tokio::test]
async fn ties_resolve_to_first_insertion_order() {
    let db = fresh_db().await;
    db.record_search("포스코", None).await.unwrap();
    db.record_search("현대차", None).await.unwrap();
    db.record_search("기아", None).await.unwrap();

    let top = db.top_keywords(DAY, 10).await.unwrap();
    let names: Vec<&str> = top.iter().map(|k| k.keyword.as_str()).collect();
    assert_eq!(names, vec!["포스코", "현대차", "기아"]);
}

#[tokio::test]
async fn limit_caps_the_result() {
    let db = fresh_db().await;
    for kw in ["a", "b", "c", "d"] {
        db.record_search(kw, None).await.unwrap();
    }
    let top = db.top_keywords(DAY, 2).await.unwrap();
    assert_eq!(top.len(), 2);
}

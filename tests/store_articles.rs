// tests/store_articles.rs
//
// Dedup-upsert and click-count properties of the article store.

use stock_insight_service::fetch::FetchedArticle;
use stock_insight_service::store::Db;

fn article(title: &str, url: &str) -> FetchedArticle {
    FetchedArticle {
        title: title.to_string(),
        url: url.to_string(),
        published_at: "2025-07-01 09:00:00".to_string(),
    }
}

async fn fresh_db() -> Db {
    let db = Db::connect_in_memory().await.expect("in-memory db");
    db.init_schema().await.expect("schema");
    db
}

#[tokio::test]
async fn repeated_urls_end_with_one_row() {
    let db = fresh_db().await;

    // Same url twice within one call, and again in a second call.
    let batch = vec![
        article("금리 동결", "https://news.example/rate"),
        article("금리 동결 (재전송)", "https://news.example/rate"),
    ];
    let first = db.upsert_articles(&batch, "macro").await.unwrap();
    assert_eq!(first, 1);

    let second = db
        .upsert_articles(&[article("금리 동결", "https://news.example/rate")], "macro")
        .await
        .unwrap();
    assert_eq!(second, 0);

    let rows = db.list_by_source("macro", 0, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn identical_batch_inserts_zero_on_second_call() {
    let db = fresh_db().await;
    let batch = vec![
        article("a", "https://news.example/1"),
        article("b", "https://news.example/2"),
        article("c", "https://news.example/3"),
    ];
    assert_eq!(db.upsert_articles(&batch, "macro").await.unwrap(), 3);
    assert_eq!(db.upsert_articles(&batch, "macro").await.unwrap(), 0);
}

#[tokio::test]
async fn refetch_never_updates_stored_fields() {
    // First write wins: a re-fetched article with a changed title leaves the
    // stored row untouched.
    let db = fresh_db().await;
    db.upsert_articles(&[article("원래 제목", "https://news.example/x")], "macro")
        .await
        .unwrap();
    db.upsert_articles(&[article("바뀐 제목", "https://news.example/x")], "macro")
        .await
        .unwrap();

    let rows = db.list_by_source("macro", 0, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "원래 제목");
}

#[tokio::test]
async fn list_is_newest_first_and_source_scoped() {
    let db = fresh_db().await;
    db.upsert_articles(&[article("old", "https://news.example/old")], "macro")
        .await
        .unwrap();
    db.upsert_articles(&[article("theme", "https://news.example/t")], "반도체")
        .await
        .unwrap();
    db.upsert_articles(&[article("new", "https://news.example/new")], "macro")
        .await
        .unwrap();

    let rows = db.list_by_source("macro", 0, 10).await.unwrap();
    let titles: Vec<&str> = rows.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["new", "old"]);
}

#[tokio::test]
async fn increment_click_counts_and_misses() {
    let db = fresh_db().await;
    db.upsert_articles(&[article("a", "https://news.example/1")], "macro")
        .await
        .unwrap();
    let id = db.list_by_source("macro", 0, 1).await.unwrap()[0].id;

    let updated = db.increment_click(id).await.unwrap().expect("row exists");
    assert_eq!(updated.click_count, 1);
    let updated = db.increment_click(id).await.unwrap().unwrap();
    assert_eq!(updated.click_count, 2);

    // A stale id is a normal not-found outcome and changes nothing.
    assert!(db.increment_click(id + 999).await.unwrap().is_none());
    let rows = db.list_by_source("macro", 0, 10).await.unwrap();
    assert_eq!(rows[0].click_count, 2);
}

#[tokio::test]
async fn top_by_click_orders_descending() {
    let db = fresh_db().await;
    for (t, u) in [("a", "https://n/1"), ("b", "https://n/2"), ("c", "https://n/3")] {
        db.upsert_articles(&[article(t, u)], "macro").await.unwrap();
    }
    let rows = db.list_by_source("macro", 0, 10).await.unwrap();
    // rows are newest first: c, b, a
    let (id_c, id_b) = (rows[0].id, rows[1].id);
    db.increment_click(id_b).await.unwrap();
    db.increment_click(id_b).await.unwrap();
    db.increment_click(id_c).await.unwrap();

    let top = db.top_by_click(10).await.unwrap();
    let titles: Vec<&str> = top.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["b", "c", "a"]);
}

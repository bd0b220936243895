//! Integration tests for database initialization and the sentence cache

use emotag_common::db::{init_database, SentenceCache};
use tempfile::TempDir;

async fn setup_pool() -> (TempDir, sqlx::SqlitePool) {
    let dir = TempDir::new().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("emotag.db"))
        .await
        .expect("Should initialize database");
    (dir, pool)
}

#[tokio::test]
async fn init_creates_database_file_and_schema() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("emotag.db");
    assert!(!db_path.exists());

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists());

    // Both tables must exist
    for table in ["processed_sentences", "init_locks"] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "Missing table {}", table);
    }
}

#[tokio::test]
async fn init_reopens_existing_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("emotag.db");

    let pool1 = init_database(&db_path).await.unwrap();
    drop(pool1);

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to reopen database: {:?}", pool2.err());
}

#[tokio::test]
async fn lookup_on_empty_cache_finds_nothing() {
    let (_dir, pool) = setup_pool().await;
    let cache = SentenceCache::new(pool);

    let found = cache
        .lookup_many(&["i enjoy sunny days".to_string()])
        .await;

    assert!(!found.degraded);
    assert!(found.value.is_empty());
}

#[tokio::test]
async fn lookup_with_no_keys_skips_the_store() {
    let (_dir, pool) = setup_pool().await;
    let cache = SentenceCache::new(pool);

    let found = cache.lookup_many(&[]).await;
    assert!(!found.degraded);
    assert!(found.value.is_empty());
}

#[tokio::test]
async fn lookup_returns_only_matching_subset() {
    let (_dir, pool) = setup_pool().await;
    let cache = SentenceCache::new(pool);

    let inserted = cache
        .insert_many(&[
            ("i enjoy sunny days".to_string(), "joy".to_string()),
            ("i miss you".to_string(), "sadness".to_string()),
        ])
        .await;
    assert_eq!(inserted.value, 2);

    let found = cache
        .lookup_many(&[
            "i enjoy sunny days".to_string(),
            "never seen before".to_string(),
        ])
        .await;

    assert_eq!(found.value.len(), 1);
    assert_eq!(found.value.get("i enjoy sunny days").map(String::as_str), Some("joy"));
}

#[tokio::test]
async fn insert_never_overwrites_existing_result() {
    let (_dir, pool) = setup_pool().await;
    let cache = SentenceCache::new(pool);

    cache
        .insert_many(&[("i enjoy sunny days".to_string(), "joy".to_string())])
        .await;

    // A racing writer losing the insert race must fail harmlessly
    let second = cache
        .insert_many(&[("i enjoy sunny days".to_string(), "anger".to_string())])
        .await;
    assert!(!second.degraded);
    assert_eq!(second.value, 0);

    let found = cache
        .lookup_many(&["i enjoy sunny days".to_string()])
        .await;
    assert_eq!(found.value.get("i enjoy sunny days").map(String::as_str), Some("joy"));
}

#[tokio::test]
async fn store_failure_degrades_instead_of_propagating() {
    let (_dir, pool) = setup_pool().await;
    let cache = SentenceCache::new(pool.clone());

    // Closing the pool makes every subsequent operation fail
    pool.close().await;

    let found = cache
        .lookup_many(&["i enjoy sunny days".to_string()])
        .await;
    assert!(found.degraded);
    assert!(found.value.is_empty());

    let inserted = cache
        .insert_many(&[("i enjoy sunny days".to_string(), "joy".to_string())])
        .await;
    assert!(inserted.degraded);
    assert_eq!(inserted.value, 0);
}

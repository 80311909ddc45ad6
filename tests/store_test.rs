//! Link store behaviour, exercised against both backends

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::NamedTempFile;

use shortlink::database::RedbStore;
use shortlink::error::LinkError;
use shortlink::store::{LinkStore, MemoryStore};

/// Runs the same async test body against the memory and redb backends
macro_rules! store_test {
    ($name:ident, $body:ident) => {
        mod $name {
            use super::*;

            #[tokio::test]
            async fn memory() {
                $body(Arc::new(MemoryStore::new())).await;
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn redb() {
                let temp_db = NamedTempFile::new().expect("Failed to create temp file");
                let store = RedbStore::open(temp_db.path()).expect("Failed to open test database");
                $body(Arc::new(store)).await;
            }
        }
    };
}

async fn put_then_get_then_resolve(store: Arc<dyn LinkStore>) {
    let created = store
        .put("abc123", "https://example.com", None)
        .await
        .unwrap();
    assert_eq!(created.visit_count, 0);
    assert_eq!(created.expires_at, None);

    let link = store.get("abc123").await.unwrap();
    assert_eq!(link.target_url, "https://example.com");
    assert_eq!(link.visit_count, 0);

    let target = store.resolve("abc123").await.unwrap();
    assert_eq!(target, "https://example.com");
    assert_eq!(store.get("abc123").await.unwrap().visit_count, 1);
}
store_test!(scenario_put_get_resolve, put_then_get_then_resolve);

async fn duplicate_put_conflicts(store: Arc<dyn LinkStore>) {
    store.put("dup", "https://a.example", None).await.unwrap();

    let err = store.put("dup", "https://b.example", None).await.unwrap_err();
    assert!(matches!(err, LinkError::CodeConflict(code) if code == "dup"));

    // The original record is untouched
    assert_eq!(store.get("dup").await.unwrap().target_url, "https://a.example");
}
store_test!(put_rejects_taken_code, duplicate_put_conflicts);

async fn missing_code_is_not_found(store: Arc<dyn LinkStore>) {
    assert!(matches!(store.get("nope").await, Err(LinkError::NotFound(_))));
    assert!(matches!(store.resolve("nope").await, Err(LinkError::NotFound(_))));
    assert!(!store.exists("nope").await.unwrap());
}
store_test!(unknown_code, missing_code_is_not_found);

async fn expired_link_is_hidden_but_kept(store: Arc<dyn LinkStore>) {
    let expires_at = Utc::now() + chrono::Duration::milliseconds(500);
    store
        .put("brief", "https://example.com/brief", Some(expires_at))
        .await
        .unwrap();
    assert!(store.get("brief").await.is_ok());

    tokio::time::sleep(Duration::from_millis(700)).await;

    assert!(matches!(store.get("brief").await, Err(LinkError::NotFound(_))));
    assert!(matches!(store.resolve("brief").await, Err(LinkError::NotFound(_))));

    // Still physically present, so the code can never be handed out again
    assert!(store.exists("brief").await.unwrap());
    let err = store
        .put("brief", "https://example.com/other", None)
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::CodeConflict(_)));
}
store_test!(expiry, expired_link_is_hidden_but_kept);

async fn expiry_before_creation_is_rejected(store: Arc<dyn LinkStore>) {
    let past = Utc::now() - chrono::Duration::minutes(1);
    let err = store
        .put("past", "https://example.com", Some(past))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::InvalidInput(_)));
    assert!(!store.exists("past").await.unwrap());
}
store_test!(past_expiry, expiry_before_creation_is_rejected);

async fn get_does_not_count_visits(store: Arc<dyn LinkStore>) {
    store.put("peek", "https://example.com", None).await.unwrap();
    for _ in 0..3 {
        store.get("peek").await.unwrap();
    }
    assert_eq!(store.get("peek").await.unwrap().visit_count, 0);
}
store_test!(get_is_read_only, get_does_not_count_visits);

async fn concurrent_resolves_are_all_counted(store: Arc<dyn LinkStore>) {
    store.put("hot", "https://example.com/hot", None).await.unwrap();

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.resolve("hot").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "https://example.com/hot");
    }

    assert_eq!(store.get("hot").await.unwrap().visit_count, 50);
}
store_test!(concurrent_resolve, concurrent_resolves_are_all_counted);

async fn concurrent_puts_admit_one_winner(store: Arc<dyn LinkStore>) {
    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .put("race", &format!("https://example.com/{i}"), None)
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(LinkError::CodeConflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);
}
store_test!(concurrent_put, concurrent_puts_admit_one_winner);

#[tokio::test]
async fn redb_records_survive_reopen() {
    let temp_db = NamedTempFile::new().unwrap();

    {
        let store = RedbStore::open(temp_db.path()).unwrap();
        store.put("keep", "https://example.com/keep", None).await.unwrap();
        store.resolve("keep").await.unwrap();
    }

    let store = RedbStore::open(temp_db.path()).unwrap();
    let link = store.get("keep").await.unwrap();
    assert_eq!(link.target_url, "https://example.com/keep");
    assert_eq!(link.visit_count, 1);
}

#[tokio::test]
async fn isolated_memory_stores() {
    let first = MemoryStore::new();
    let second = MemoryStore::new();

    first.put("solo", "https://example.com", None).await.unwrap();

    assert_eq!(first.len().await, 1);
    assert!(second.is_empty().await);
    assert!(!second.exists("solo").await.unwrap());
}

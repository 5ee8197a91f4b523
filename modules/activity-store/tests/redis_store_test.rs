//! Integration tests for RedisStore.
//! Requires a Redis instance. Set REDIS_TEST_URL or these tests are skipped.

use std::time::Duration;

use activity_store::{
    ActivityStore, DedupInsert, InsertOutcome, RedisStore, WriteBatch, WriteOp,
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

/// Get a store connected to the test instance, or skip if none is available.
async fn test_store() -> Option<RedisStore> {
    let url = std::env::var("REDIS_TEST_URL").ok()?;
    RedisStore::connect(&url).await.ok()
}

/// Unique key prefix so tests never see each other's data.
fn ns() -> String {
    format!("activity-test:{}", Uuid::new_v4())
}

fn dedup<'a>(ns: &'a str, log_key: &'a str, id: &'a str, payload: &'a str, max_len: u64) -> DedupInsert<'a> {
    DedupInsert {
        stream_key: ns,
        log_key,
        event_id: id,
        payload,
        max_len,
    }
}

// =========================================================================
// Dedup script
// =========================================================================

#[tokio::test]
async fn second_insert_of_same_id_is_duplicate() {
    let Some(store) = test_store().await else {
        return;
    };
    let stream = format!("{}:stream", ns());
    let log = format!("{stream}:log:1");

    let first = store
        .insert_event_once(dedup(&stream, &log, "1", r#"{"v":1}"#, 100))
        .await
        .unwrap();
    let second = store
        .insert_event_once(dedup(&stream, &log, "1", r#"{"v":2}"#, 100))
        .await
        .unwrap();

    assert_eq!(first, InsertOutcome::Inserted);
    assert_eq!(second, InsertOutcome::Duplicate);
    assert_eq!(store.stream_len(&stream).await.unwrap(), 1);

    let entries = store.stream_entries(&stream).await.unwrap();
    assert_eq!(entries[0].payload, r#"{"v":1}"#);
    // The marker points at the stream entry it created.
    assert_eq!(store.get(&log).await.unwrap(), Some(entries[0].id.clone()));
}

#[tokio::test]
async fn stream_is_trimmed_to_most_recent() {
    let Some(store) = test_store().await else {
        return;
    };
    let stream = format!("{}:stream", ns());

    for i in 0..10 {
        let id = i.to_string();
        let log = format!("{stream}:log:{i}");
        store
            .insert_event_once(dedup(&stream, &log, &id, "{}", 4))
            .await
            .unwrap();
    }

    let ids: Vec<String> = store
        .stream_entries(&stream)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_id)
        .collect();
    assert_eq!(ids, vec!["6", "7", "8", "9"]);
}

#[tokio::test]
async fn concurrent_inserts_of_one_id_append_once() {
    let Some(store) = test_store().await else {
        return;
    };
    let stream = format!("{}:stream", ns());
    let log = format!("{stream}:log:race");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let stream = stream.clone();
        let log = log.clone();
        handles.push(tokio::spawn(async move {
            store
                .insert_event_once(dedup(&stream, &log, "race", "{}", 100))
                .await
                .unwrap()
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap() == InsertOutcome::Inserted {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);
    assert_eq!(store.stream_len(&stream).await.unwrap(), 1);
}

// =========================================================================
// Scores
// =========================================================================

#[tokio::test]
async fn batch_increments_and_union() {
    let Some(store) = test_store().await else {
        return;
    };
    let prefix = ns();
    let h0 = format!("{prefix}:0");
    let h1 = format!("{prefix}:1");
    let sum = format!("{prefix}:sum");
    let at = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();

    let mut batch = WriteBatch::new(&store, 2);
    for _ in 0..3 {
        batch.stage(WriteOp::increment(&h0, "alice")).await.unwrap();
    }
    batch.stage(WriteOp::expire_at(&h0, at)).await.unwrap();
    batch.stage(WriteOp::increment(&h1, "alice")).await.unwrap();
    batch.stage(WriteOp::increment(&h1, "alice")).await.unwrap();
    batch.stage(WriteOp::increment(&h1, "bob")).await.unwrap();
    batch.flush().await.unwrap();

    assert_eq!(
        store.scores(&h0).await.unwrap(),
        vec![("alice".to_string(), 3)]
    );

    let missing = format!("{prefix}:2");
    let cardinality = store
        .union_scores(&sum, &[h0.clone(), h1.clone(), missing])
        .await
        .unwrap();
    assert_eq!(cardinality, 2);
    assert_eq!(
        store.scores(&sum).await.unwrap(),
        vec![("alice".to_string(), 5), ("bob".to_string(), 1)]
    );
}

#[tokio::test]
async fn set_if_absent_keeps_first_value() {
    let Some(store) = test_store().await else {
        return;
    };
    let key = format!("{}:created", ns());

    assert!(store.set_if_absent(&key, "first").await.unwrap());
    assert!(!store.set_if_absent(&key, "second").await.unwrap());
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("first"));
}

#[tokio::test]
async fn lease_is_exclusive_and_token_bound() {
    let Some(store) = test_store().await else {
        return;
    };
    let key = format!("{}:lease", ns());
    let ttl = Duration::from_secs(30);

    assert!(store.acquire_lease(&key, "a", ttl).await.unwrap());
    assert!(!store.acquire_lease(&key, "b", ttl).await.unwrap());
    assert!(!store.release_lease(&key, "b").await.unwrap());
    assert!(store.release_lease(&key, "a").await.unwrap());
    assert!(!store.exists(&key).await.unwrap());
}

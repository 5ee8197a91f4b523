//! Ingest cycle behavior against the in-memory store.

use std::sync::Arc;

use activity_common::keys;
use activity_ingest::{EventFeed, IngestOptions, Ingestor};
use activity_store::{ActivityStore, MemoryStore};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use github_client::Event;

/// Returns the same batch on every fetch.
struct FixedFeed(Vec<Event>);

#[async_trait]
impl EventFeed for FixedFeed {
    async fn fetch(&self) -> Result<Vec<Event>> {
        Ok(self.0.clone())
    }
}

struct BrokenFeed;

#[async_trait]
impl EventFeed for BrokenFeed {
    async fn fetch(&self) -> Result<Vec<Event>> {
        bail!("HTTP error! status: 503")
    }
}

fn push(id: &str, login: &str) -> Event {
    Event::new(id, "PushEvent", Some(login))
}

fn ingestor(store: &Arc<MemoryStore>, feed: impl EventFeed + 'static, max: u64) -> Ingestor {
    Ingestor::new(
        store.clone(),
        Box::new(feed),
        IngestOptions {
            max_stream_len: max,
        },
    )
}

#[tokio::test]
async fn refetching_the_same_events_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let feed = FixedFeed(vec![push("1", "alice"), push("2", "bob")]);
    let ingestor = ingestor(&store, feed, 100);
    let now = Utc::now();

    let first = ingestor.run(now).await.unwrap();
    let second = ingestor.run(now).await.unwrap();

    assert_eq!(first.inserted, 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(store.stream_len(&keys::stream_key()).await.unwrap(), 2);
    assert!(store.exists(&keys::log_key("1")).await.unwrap());
}

#[tokio::test]
async fn same_id_with_different_payload_is_still_a_duplicate() {
    let store = Arc::new(MemoryStore::new());
    ingestor(&store, FixedFeed(vec![push("9", "alice")]), 100)
        .run(Utc::now())
        .await
        .unwrap();

    let stats = ingestor(&store, FixedFeed(vec![Event::new("9", "IssuesEvent", Some("carol"))]), 100)
        .run(Utc::now())
        .await
        .unwrap();

    assert_eq!(stats.duplicates, 1);
    let entries = store.stream_entries(&keys::stream_key()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].payload.contains("PushEvent"));
}

#[tokio::test]
async fn bot_events_never_reach_the_stream() {
    let store = Arc::new(MemoryStore::new());
    let feed = FixedFeed(vec![
        push("1", "dependabot[bot]"),
        push("2", "foo-bot"),
        push("3", "alice"),
    ]);

    let stats = ingestor(&store, feed, 100).run(Utc::now()).await.unwrap();

    assert_eq!(stats.bots_skipped, 2);
    assert_eq!(stats.inserted, 1);
    assert!(!store.exists(&keys::log_key("1")).await.unwrap());
    assert!(!store.exists(&keys::log_key("2")).await.unwrap());
    let ids: Vec<String> = store
        .stream_entries(&keys::stream_key())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_id)
        .collect();
    assert_eq!(ids, vec!["3"]);
}

#[tokio::test]
async fn stream_holds_most_recent_accepted_events() {
    let store = Arc::new(MemoryStore::new());
    let events = (1..=6).map(|i| push(&i.to_string(), "alice")).collect();

    ingestor(&store, FixedFeed(events), 4).run(Utc::now()).await.unwrap();

    let ids: Vec<String> = store
        .stream_entries(&keys::stream_key())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_id)
        .collect();
    assert_eq!(ids, vec!["3", "4", "5", "6"]);
    // Markers outlive trimmed entries, so old ids stay deduplicated.
    assert!(store.exists(&keys::log_key("1")).await.unwrap());
}

#[tokio::test]
async fn stream_entry_carries_full_event_json() {
    let store = Arc::new(MemoryStore::new());
    let event: Event = serde_json::from_str(
        r#"{"id":"77","type":"PushEvent","actor":{"login":"alice","display_login":"alice"},"repo":{"name":"o/r"}}"#,
    )
    .unwrap();

    ingestor(&store, FixedFeed(vec![event]), 10).run(Utc::now()).await.unwrap();

    let entries = store.stream_entries(&keys::stream_key()).await.unwrap();
    let stored: serde_json::Value = serde_json::from_str(&entries[0].payload).unwrap();
    assert_eq!(stored["repo"]["name"], "o/r");
    assert_eq!(entries[0].event_id, "77");
}

#[tokio::test]
async fn one_failing_event_does_not_stop_the_cycle() {
    let store = Arc::new(MemoryStore::new().fail_on_event("2"));
    let feed = FixedFeed(vec![push("1", "alice"), push("2", "bob"), push("3", "carol")]);

    let stats = ingestor(&store, feed, 100).run(Utc::now()).await.unwrap();

    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.failed, 1);
    assert!(!store.exists(&keys::log_key("2")).await.unwrap());
    assert!(stats.created_at_set);
}

#[tokio::test]
async fn created_at_is_written_once() {
    let store = Arc::new(MemoryStore::new());
    let first = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap();

    let a = ingestor(&store, FixedFeed(vec![]), 100).run(first).await.unwrap();
    let b = ingestor(&store, FixedFeed(vec![]), 100).run(later).await.unwrap();

    assert!(a.created_at_set);
    assert!(!b.created_at_set);
    assert_eq!(
        store.get(&keys::created_at_key()).await.unwrap().as_deref(),
        Some("2025-01-01T10:00:00.000Z")
    );
}

#[tokio::test]
async fn feed_failure_aborts_before_any_write() {
    let store = Arc::new(MemoryStore::new());

    let result = ingestor(&store, BrokenFeed, 100).run(Utc::now()).await;

    assert!(result.is_err());
    assert!(store.keys().is_empty());
}

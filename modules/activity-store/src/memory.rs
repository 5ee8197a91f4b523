//! In-process store with the same semantics as `RedisStore`, for tests.
//!
//! Expirations are recorded but never enforced; tests inspect them through
//! [`MemoryStore::expiry`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};
use crate::traits::ActivityStore;
use crate::types::{DedupInsert, InsertOutcome, StreamEntry, WriteOp};

#[derive(Default)]
struct Inner {
    strings: HashMap<String, String>,
    streams: HashMap<String, VecDeque<StreamEntry>>,
    zsets: HashMap<String, HashMap<String, i64>>,
    expiries: HashMap<String, DateTime<Utc>>,
    expire_log: Vec<(String, DateTime<Utc>)>,
    next_entry: u64,
    apply_calls: usize,
}

impl Inner {
    fn exists(&self, key: &str) -> bool {
        self.strings.contains_key(key)
            || self.streams.contains_key(key)
            || self.zsets.contains_key(key)
    }

    fn expire_at(&mut self, key: &str, at: DateTime<Utc>) {
        // EXPIREAT on a missing key is a no-op.
        if self.exists(key) {
            self.expiries.insert(key.to_string(), at);
            self.expire_log.push((key.to_string(), at));
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    failing_events: HashSet<String>,
    failing_exists: HashSet<String>,
    apply_limit: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `insert_event_once` fail for this event id.
    pub fn fail_on_event(mut self, event_id: &str) -> Self {
        self.failing_events.insert(event_id.to_string());
        self
    }

    /// Make `exists` fail for this key.
    pub fn fail_exists_for(mut self, key: &str) -> Self {
        self.failing_exists.insert(key.to_string());
        self
    }

    /// Let the first `n` `apply` calls through; every later one fails
    /// without writing anything.
    pub fn fail_apply_after(mut self, n: usize) -> Self {
        self.apply_limit = Some(n);
        self
    }

    /// Drop a key as if its TTL had run out.
    pub fn evict(&self, key: &str) {
        let mut inner = self.lock();
        inner.strings.remove(key);
        inner.streams.remove(key);
        inner.zsets.remove(key);
        inner.expiries.remove(key);
    }

    /// Seed a sorted set directly, bypassing batches.
    pub fn seed_scores(&self, key: &str, members: &[(&str, i64)]) {
        let mut inner = self.lock();
        let zset = inner.zsets.entry(key.to_string()).or_default();
        for (member, score) in members {
            *zset.entry(member.to_string()).or_default() += score;
        }
    }

    pub fn expiry(&self, key: &str) -> Option<DateTime<Utc>> {
        self.lock().expiries.get(key).copied()
    }

    /// Every effective expiration set on `key`, oldest first.
    pub fn expire_calls(&self, key: &str) -> Vec<DateTime<Utc>> {
        self.lock()
            .expire_log
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, at)| *at)
            .collect()
    }

    /// Number of `apply` round-trips so far, failed ones included.
    pub fn apply_calls(&self) -> usize {
        self.lock().apply_calls
    }

    /// All keys currently present, sorted.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.lock();
        let mut keys: Vec<String> = inner
            .strings
            .keys()
            .chain(inner.streams.keys())
            .chain(inner.zsets.keys())
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn insert_event_once(&self, req: DedupInsert<'_>) -> Result<InsertOutcome> {
        if self.failing_events.contains(req.event_id) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for event {}",
                req.event_id
            )));
        }

        let mut inner = self.lock();
        if inner.strings.contains_key(req.log_key) {
            return Ok(InsertOutcome::Duplicate);
        }

        inner.next_entry += 1;
        let entry_id = format!("{}-0", inner.next_entry);
        let stream = inner.streams.entry(req.stream_key.to_string()).or_default();
        stream.push_back(StreamEntry {
            id: entry_id.clone(),
            event_id: req.event_id.to_string(),
            payload: req.payload.to_string(),
        });
        while stream.len() as u64 > req.max_len {
            stream.pop_front();
        }
        inner.strings.insert(req.log_key.to_string(), entry_id);

        Ok(InsertOutcome::Inserted)
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let mut inner = self.lock();
        if inner.strings.contains_key(key) {
            return Ok(false);
        }
        inner.strings.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().strings.get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        if self.failing_exists.contains(key) {
            return Err(StoreError::Unavailable(format!("injected failure for {key}")));
        }
        Ok(self.lock().exists(key))
    }

    async fn apply(&self, ops: &[WriteOp]) -> Result<()> {
        let mut inner = self.lock();
        inner.apply_calls += 1;
        if self.apply_limit.is_some_and(|n| inner.apply_calls > n) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on apply #{}",
                inner.apply_calls
            )));
        }
        for op in ops {
            match op {
                WriteOp::IncrementScore { key, member, by } => {
                    let zset = inner.zsets.entry(key.clone()).or_default();
                    *zset.entry(member.clone()).or_default() += by;
                }
                WriteOp::ExpireAt { key, at } => inner.expire_at(key, *at),
            }
        }
        Ok(())
    }

    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        self.lock().expire_at(key, at);
        Ok(())
    }

    async fn union_scores(&self, dest: &str, sources: &[String]) -> Result<u64> {
        let mut inner = self.lock();
        let mut union: HashMap<String, i64> = HashMap::new();
        for source in sources {
            if let Some(zset) = inner.zsets.get(source) {
                for (member, score) in zset {
                    *union.entry(member.clone()).or_default() += score;
                }
            }
        }

        // ZUNIONSTORE overwrites dest, dropping any previous TTL.
        inner.expiries.remove(dest);
        let cardinality = union.len() as u64;
        if union.is_empty() {
            inner.zsets.remove(dest);
        } else {
            inner.zsets.insert(dest.to_string(), union);
        }
        Ok(cardinality)
    }

    async fn scores(&self, key: &str) -> Result<Vec<(String, i64)>> {
        let inner = self.lock();
        let mut members: Vec<(String, i64)> = inner
            .zsets
            .get(key)
            .map(|zset| zset.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();
        // Redis orders equal scores lexicographically; ZREVRANGE reverses that.
        members.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        Ok(members)
    }

    async fn stream_entries(&self, key: &str) -> Result<Vec<StreamEntry>> {
        Ok(self
            .lock()
            .streams
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn stream_len(&self, key: &str) -> Result<u64> {
        Ok(self.lock().streams.get(key).map_or(0, |s| s.len() as u64))
    }

    async fn acquire_lease(&self, key: &str, token: &str, _ttl: Duration) -> Result<bool> {
        self.set_if_absent(key, token).await
    }

    async fn release_lease(&self, key: &str, token: &str) -> Result<bool> {
        let mut inner = self.lock();
        if inner.strings.get(key).map(String::as_str) == Some(token) {
            inner.strings.remove(key);
            return Ok(true);
        }
        Ok(false)
    }
}

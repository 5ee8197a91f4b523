use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{DedupInsert, InsertOutcome, StreamEntry, WriteOp};

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Atomically: if the log marker exists return `Duplicate`; otherwise
    /// create it, append `(event_id, payload)` to the stream and trim the
    /// stream to `max_len` entries, oldest first.
    async fn insert_event_once(&self, req: DedupInsert<'_>) -> Result<InsertOutcome>;

    /// Write `value` only if `key` has no value. Returns whether it was written.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Apply ops in order in a single round-trip.
    async fn apply(&self, ops: &[WriteOp]) -> Result<()>;

    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> Result<()>;

    /// Store the sum-union of `sources` into `dest`. Missing sources count
    /// as empty. Returns the cardinality of `dest`.
    async fn union_scores(&self, dest: &str, sources: &[String]) -> Result<u64>;

    /// Members of a sorted set with their scores, highest first.
    async fn scores(&self, key: &str) -> Result<Vec<(String, i64)>>;

    /// Stream entries, oldest first.
    async fn stream_entries(&self, key: &str) -> Result<Vec<StreamEntry>>;

    async fn stream_len(&self, key: &str) -> Result<u64>;

    /// Take a lease if nobody holds it. Expires after `ttl` regardless.
    async fn acquire_lease(&self, key: &str, token: &str, ttl: Duration) -> Result<bool>;

    /// Release a lease, but only if `token` still holds it.
    async fn release_lease(&self, key: &str, token: &str) -> Result<bool>;
}

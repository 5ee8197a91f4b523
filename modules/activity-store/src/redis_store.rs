//! Redis backend. The dedup step runs as one server-side Lua script, so two
//! overlapping ingest runs can never both see a missing marker.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::streams::StreamRangeReply;
use redis::{AsyncCommands, Script};

use crate::error::{Result, StoreError};
use crate::traits::ActivityStore;
use crate::types::{DedupInsert, InsertOutcome, StreamEntry, WriteOp};

const INSERT_EVENT_LUA: &str = include_str!("lua/insert_event.lua");
const RELEASE_LEASE_LUA: &str = include_str!("lua/release_lease.lua");

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    insert_event: Script,
    release_lease: Script,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::debug!("Connected to Redis");
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            insert_event: Script::new(INSERT_EVENT_LUA),
            release_lease: Script::new(RELEASE_LEASE_LUA),
        }
    }
}

#[async_trait]
impl ActivityStore for RedisStore {
    async fn insert_event_once(&self, req: DedupInsert<'_>) -> Result<InsertOutcome> {
        let mut conn = self.conn.clone();
        let reply: i64 = self
            .insert_event
            .key(req.stream_key)
            .key(req.log_key)
            .arg(req.event_id)
            .arg(req.payload)
            .arg(req.max_len)
            .invoke_async(&mut conn)
            .await?;
        Ok(InsertOutcome::from_reply(reply))
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn apply(&self, ops: &[WriteOp]) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for op in ops {
            match op {
                WriteOp::IncrementScore { key, member, by } => {
                    pipe.cmd("ZINCRBY").arg(key).arg(*by).arg(member).ignore();
                }
                WriteOp::ExpireAt { key, at } => {
                    pipe.cmd("EXPIREAT").arg(key).arg(at.timestamp()).ignore();
                }
            }
        }

        let mut conn = self.conn.clone();
        let () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        let mut conn = self.conn.clone();
        let _applied: i64 = redis::cmd("EXPIREAT")
            .arg(key)
            .arg(at.timestamp())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn union_scores(&self, dest: &str, sources: &[String]) -> Result<u64> {
        let mut conn = self.conn.clone();
        if sources.is_empty() {
            let _removed: i64 = conn.del(dest).await?;
            return Ok(0);
        }

        let cardinality: u64 = redis::cmd("ZUNIONSTORE")
            .arg(dest)
            .arg(sources.len())
            .arg(sources)
            .arg("AGGREGATE")
            .arg("SUM")
            .query_async(&mut conn)
            .await?;
        Ok(cardinality)
    }

    async fn scores(&self, key: &str) -> Result<Vec<(String, i64)>> {
        let mut conn = self.conn.clone();
        let members: Vec<(String, f64)> = redis::cmd("ZREVRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .arg("WITHSCORES")
            .query_async(&mut conn)
            .await?;
        Ok(members
            .into_iter()
            .map(|(member, score)| (member, score.round() as i64))
            .collect())
    }

    async fn stream_entries(&self, key: &str) -> Result<Vec<StreamEntry>> {
        let mut conn = self.conn.clone();
        let reply: StreamRangeReply = redis::cmd("XRANGE")
            .arg(key)
            .arg("-")
            .arg("+")
            .query_async(&mut conn)
            .await?;

        reply
            .ids
            .into_iter()
            .map(|entry| {
                let event_id: String = entry.get("id").ok_or_else(|| {
                    StoreError::UnexpectedReply(format!("stream entry {} has no id", entry.id))
                })?;
                let payload: String = entry.get("event").ok_or_else(|| {
                    StoreError::UnexpectedReply(format!("stream entry {} has no event", entry.id))
                })?;
                Ok(StreamEntry {
                    id: entry.id,
                    event_id,
                    payload,
                })
            })
            .collect()
    }

    async fn stream_len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let len: u64 = redis::cmd("XLEN").arg(key).query_async(&mut conn).await?;
        Ok(len)
    }

    async fn acquire_lease(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis().max(1) as u64)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn release_lease(&self, key: &str, token: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let released: i64 = self
            .release_lease
            .key(key)
            .arg(token)
            .invoke_async(&mut conn)
            .await?;
        Ok(released > 0)
    }
}

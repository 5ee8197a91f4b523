use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use activity_common::{is_bot_login, keys};
use activity_store::{ActivityStore, DedupInsert, InsertOutcome};
use github_client::Event;

use crate::feed::EventFeed;
use crate::stats::IngestStats;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Upper bound on the shared event stream.
    pub max_stream_len: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_stream_len: 1000,
        }
    }
}

/// Appends each live event to the shared stream exactly once.
///
/// Re-fetching is harmless: the per-event marker written by the store's
/// atomic insert is the only dedup signal, so no feed position is kept.
pub struct Ingestor {
    store: Arc<dyn ActivityStore>,
    feed: Box<dyn EventFeed>,
    options: IngestOptions,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn ActivityStore>,
        feed: Box<dyn EventFeed>,
        options: IngestOptions,
    ) -> Self {
        Self {
            store,
            feed,
            options,
        }
    }

    /// Run one cycle. A feed failure aborts the cycle before anything is
    /// written; a store failure on one event only skips that event.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<IngestStats> {
        let events = self.feed.fetch().await.context("Failed to fetch events")?;
        info!(count = events.len(), "Fetched events");

        let mut stats = IngestStats {
            fetched: events.len() as u32,
            ..Default::default()
        };
        let stream_key = keys::stream_key();

        for event in &events {
            if event.actor_name().is_some_and(is_bot_login) {
                debug!(event_id = %event.id, "Skipping bot event");
                stats.bots_skipped += 1;
                continue;
            }

            match self.insert(&stream_key, event).await {
                Ok(InsertOutcome::Inserted) => {
                    debug!(event_id = %event.id, "Event inserted");
                    stats.inserted += 1;
                }
                Ok(InsertOutcome::Duplicate) => {
                    debug!(event_id = %event.id, "Event already in stream");
                    stats.duplicates += 1;
                }
                Err(e) => {
                    warn!(event_id = %event.id, error = %e, "Failed to insert event");
                    stats.failed += 1;
                }
            }
        }

        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        stats.created_at_set = self
            .store
            .set_if_absent(&keys::created_at_key(), &stamp)
            .await
            .context("Failed to write created-at marker")?;

        Ok(stats)
    }

    async fn insert(&self, stream_key: &str, event: &Event) -> Result<InsertOutcome> {
        let payload = event.to_json()?;
        let log_key = keys::log_key(&event.id);
        let outcome = self
            .store
            .insert_event_once(DedupInsert {
                stream_key,
                log_key: &log_key,
                event_id: &event.id,
                payload: &payload,
                max_len: self.options.max_stream_len,
            })
            .await?;
        Ok(outcome)
    }
}

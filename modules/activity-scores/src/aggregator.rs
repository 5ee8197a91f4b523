//! Hourly contributor scores for one UTC day, rolled up into a daily summary.
//!
//! Hours are walked backward from the last complete one. An existing hour
//! bucket is the resumption checkpoint: it ends the walk, and every earlier
//! hour is assumed done. An hour with no scoring events leaves no bucket and
//! is indistinguishable from an unprocessed one, so it is fetched again on
//! the next run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use uuid::Uuid;

use activity_common::{keys, ScoreWindow};
use activity_store::{ActivityStore, WriteBatch, WriteOp};

use crate::archive::HourlyArchive;
use crate::record::ScoringRecord;
use crate::stats::{HourOutcome, ScoreStats};

#[derive(Debug, Clone)]
pub struct ScoreOptions {
    /// Staged writes per store round-trip.
    pub batch_size: usize,
    /// Parent of the per-run scratch directory.
    pub scratch_root: PathBuf,
    /// Upper bound on how long a crashed run can block the next one.
    pub lease_ttl: Duration,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            scratch_root: std::env::temp_dir(),
            lease_ttl: Duration::from_secs(3600),
        }
    }
}

pub struct ScoreAggregator {
    store: Arc<dyn ActivityStore>,
    archive: Box<dyn HourlyArchive>,
    options: ScoreOptions,
}

impl ScoreAggregator {
    pub fn new(
        store: Arc<dyn ActivityStore>,
        archive: Box<dyn HourlyArchive>,
        options: ScoreOptions,
    ) -> Self {
        Self {
            store,
            archive,
            options,
        }
    }

    /// Score every complete hour of `window.date` not yet scored, then
    /// rebuild the daily summary. Holds the day's lease throughout.
    pub async fn run(&self, window: ScoreWindow) -> Result<ScoreStats> {
        let Some(last_hour) = window.last_complete_hour() else {
            info!(date = %window.date, "No complete UTC hour yet, skipping");
            return Ok(ScoreStats::new(window.date, None));
        };

        let lease_key = keys::score_run_lease_key(window.date);
        let token = Uuid::new_v4().to_string();
        let acquired = self
            .store
            .acquire_lease(&lease_key, &token, self.options.lease_ttl)
            .await
            .context("Failed to acquire score run lease")?;
        if !acquired {
            warn!(key = lease_key.as_str(), "Another score run is in progress, exiting");
            let mut stats = ScoreStats::new(window.date, Some(last_hour));
            stats.lease_conflict = true;
            return Ok(stats);
        }

        let mut result = self.run_locked(window, last_hour).await;

        // Always release the lease
        match self.store.release_lease(&lease_key, &token).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    key = lease_key.as_str(),
                    ttl_secs = self.options.lease_ttl.as_secs(),
                    "Score run lease expired or was taken over before release; runs may have overlapped"
                );
                if let Ok(stats) = result.as_mut() {
                    stats.lease_lost = true;
                }
            }
            Err(e) => warn!(error = %e, "Failed to release score run lease"),
        }

        result
    }

    async fn run_locked(&self, window: ScoreWindow, last_hour: u32) -> Result<ScoreStats> {
        info!(
            date = %window.date,
            last_hour,
            "Processing archive hours 0-{last_hour} (UTC)"
        );

        // Removed on drop, whichever way this function exits.
        let scratch = tempfile::Builder::new()
            .prefix("contributor-scores-")
            .tempdir_in(&self.options.scratch_root)
            .with_context(|| {
                format!(
                    "Failed to create scratch dir under {}",
                    self.options.scratch_root.display()
                )
            })?;

        let mut stats = ScoreStats::new(window.date, Some(last_hour));

        for hour in (0..=last_hour).rev() {
            let key = keys::hourly_score_key(window.date, hour);

            match self.store.exists(&key).await {
                Ok(true) => {
                    info!(hour, key = key.as_str(), "Hour already processed, hours 0-{hour} done");
                    stats.resumed_at = Some(hour);
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(hour, error = %e, "Failed to check hour bucket, skipping hour");
                    stats.hours_failed += 1;
                    continue;
                }
            }

            match self.process_hour(window, hour, scratch.path()).await {
                Ok(outcome) => {
                    info!(
                        hour,
                        events = outcome.events,
                        scored = outcome.scored,
                        malformed = outcome.malformed,
                        "Finished hour"
                    );
                    stats.record_hour(outcome);
                }
                Err(e) => {
                    warn!(hour, error = %format!("{e:#}"), "Failed to process hour");
                    stats.hours_failed += 1;
                }
            }
        }

        stats.summary_members = self.roll_up(window, last_hour).await?;

        if let Err(e) = scratch.close() {
            warn!(error = %e, "Failed to remove scratch dir");
        }

        Ok(stats)
    }

    /// Fetch, score and re-expire one hour. The hour's file is deleted when
    /// this returns, on success or failure.
    async fn process_hour(
        &self,
        window: ScoreWindow,
        hour: u32,
        scratch: &Path,
    ) -> Result<HourOutcome> {
        let file = tempfile::Builder::new()
            .prefix(&format!("{}-{hour}-", window.date))
            .suffix(".json")
            .tempfile_in(scratch)
            .context("Failed to create hour file")?;

        self.archive
            .fetch_hour(window.date, hour, file.path())
            .await
            .with_context(|| format!("Failed to fetch archive for {} hour {hour}", window.date))?;

        let key = keys::hourly_score_key(window.date, hour);
        let expires_at = window.expires_at();
        let outcome = self.score_file(file.path(), &key, expires_at).await?;

        // Second pass so the TTL is set against the finished bucket.
        self.store
            .expire_at(&key, expires_at)
            .await
            .context("Failed to set bucket expiration")?;
        debug!(key = key.as_str(), %expires_at, "Set bucket expiration");

        Ok(outcome)
    }

    async fn score_file(
        &self,
        path: &Path,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<HourOutcome> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut lines = BufReader::new(file).split(b'\n');

        let mut batch = WriteBatch::new(self.store.as_ref(), self.options.batch_size);
        let mut expiry_staged = false;
        let mut outcome = HourOutcome::default();

        while let Some(line) = lines.next_segment().await? {
            let line = line.strip_suffix(b"\r").unwrap_or(&line);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let record = match ScoringRecord::parse(line) {
                Ok(record) => record,
                Err(e) => {
                    debug!(error = %e, "Skipping malformed event line");
                    outcome.malformed += 1;
                    continue;
                }
            };
            outcome.events += 1;

            let Some(login) = record.scoring_login() else {
                continue;
            };

            batch.stage(WriteOp::increment(key, login)).await?;
            if !expiry_staged {
                batch.stage(WriteOp::expire_at(key, expires_at)).await?;
                expiry_staged = true;
            }
            outcome.scored += 1;

            if outcome.scored % 10_000 == 0 {
                debug!(key, scored = outcome.scored, "Scoring in progress");
            }
        }

        batch.flush().await?;
        Ok(outcome)
    }

    /// Union every hour `0..=last_hour` into the daily summary, including
    /// hours this run skipped.
    async fn roll_up(&self, window: ScoreWindow, last_hour: u32) -> Result<u64> {
        let summary_key = keys::daily_summary_key(window.date);
        let hourly_keys = keys::hourly_score_keys(window.date, last_hour);

        let members = self
            .store
            .union_scores(&summary_key, &hourly_keys)
            .await
            .context("Failed to build daily summary")?;
        self.store
            .expire_at(&summary_key, window.expires_at())
            .await
            .context("Failed to set summary expiration")?;

        info!(
            key = summary_key.as_str(),
            sources = hourly_keys.len(),
            members,
            expires_at = %window.expires_at(),
            "Created daily summary"
        );
        Ok(members)
    }
}

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use github_client::ArchiveClient;

/// Source of one hour of archived events, as line-delimited JSON.
#[async_trait]
pub trait HourlyArchive: Send + Sync {
    /// Write the decompressed events for `date`/`hour` to `dest`.
    async fn fetch_hour(&self, date: NaiveDate, hour: u32, dest: &Path) -> Result<()>;
}

#[async_trait]
impl HourlyArchive for ArchiveClient {
    async fn fetch_hour(&self, date: NaiveDate, hour: u32, dest: &Path) -> Result<()> {
        self.download_hour(date, hour, dest).await?;
        Ok(())
    }
}

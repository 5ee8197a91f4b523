use anyhow::Result;
use async_trait::async_trait;
use github_client::{Event, GithubClient};

/// Source of live events for one ingest cycle.
#[async_trait]
pub trait EventFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Event>>;
}

#[async_trait]
impl EventFeed for GithubClient {
    async fn fetch(&self) -> Result<Vec<Event>> {
        Ok(self.public_events().await?)
    }
}

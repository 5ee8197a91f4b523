use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use activity_common::AppConfig;
use activity_ingest::{IngestOptions, Ingestor};
use activity_store::RedisStore;
use github_client::GithubClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("activity_ingest=info".parse()?),
        )
        .init();

    info!("Event ingest starting...");

    let config = AppConfig::from_env()?;
    config.log_redacted();

    let store = RedisStore::connect(&config.redis_url).await?;
    let feed = GithubClient::new(&config.github_api_url, config.github_token.clone())
        .with_per_page(config.events_per_page);

    let ingestor = Ingestor::new(
        Arc::new(store),
        Box::new(feed),
        IngestOptions {
            max_stream_len: config.stream_max_len,
        },
    );
    let stats = ingestor.run(chrono::Utc::now()).await?;

    info!("Ingest complete. {stats}");
    Ok(())
}

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use activity_common::{AppConfig, ScoreWindow};
use activity_scores::{ScoreAggregator, ScoreOptions};
use activity_store::RedisStore;
use github_client::ArchiveClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("activity_scores=info".parse()?),
        )
        .init();

    info!("Contributor score update starting...");

    let config = AppConfig::from_env()?;
    config.log_redacted();

    let store = RedisStore::connect(&config.redis_url).await?;
    let archive = ArchiveClient::new(&config.gh_archive_url);

    let aggregator = ScoreAggregator::new(
        Arc::new(store),
        Box::new(archive),
        ScoreOptions {
            batch_size: config.score_batch_size,
            scratch_root: config.scratch_dir.clone(),
            lease_ttl: config.score_lease_ttl,
        },
    );
    let stats = aggregator.run(ScoreWindow::now()).await?;

    info!("Score update complete. {stats}");
    Ok(())
}

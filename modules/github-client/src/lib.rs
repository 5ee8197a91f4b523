pub mod archive;
pub mod error;
pub mod types;

pub use archive::{ArchiveClient, DEFAULT_ARCHIVE_URL};
pub use error::{GithubError, Result};
pub use types::{Actor, Event, EventKind};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "oss-realtime-app";

/// Client for the public events feed (`GET /events`).
#[derive(Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    per_page: u32,
}

impl GithubClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            per_page: 100,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Fetch the most recent page of public events.
    pub async fn public_events(&self) -> Result<Vec<Event>> {
        let url = format!("{}/events?per_page={}", self.base_url, self.per_page);
        let mut req = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GithubError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.bytes().await?;
        let events: Vec<Event> = serde_json::from_slice(&body)?;
        tracing::debug!(count = events.len(), "Fetched public events");
        Ok(events)
    }
}

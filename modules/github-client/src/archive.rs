//! GH Archive hourly dumps: `{base}/{YYYY-MM-DD}-{H}.json.gz`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use flate2::write::MultiGzDecoder;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{GithubError, Result};

pub const DEFAULT_ARCHIVE_URL: &str = "https://data.gharchive.org";

/// Compressed chunks buffered between the download and the decoder.
const CHUNK_QUEUE: usize = 32;

#[derive(Clone)]
pub struct ArchiveClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArchiveClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL of one hour's archive. The hour is not zero-padded.
    pub fn archive_url(&self, date: NaiveDate, hour: u32) -> String {
        format!("{}/{}-{}.json.gz", self.base_url, date.format("%Y-%m-%d"), hour)
    }

    /// Download one hour's archive and write it, decompressed, to `dest`.
    ///
    /// The body is decoded chunk by chunk as it arrives; the compressed file
    /// is never held in memory or on disk.
    pub async fn download_hour(&self, date: NaiveDate, hour: u32, dest: &Path) -> Result<u64> {
        let url = self.archive_url(date, hour);
        tracing::info!(url = url.as_str(), "Downloading archive");

        let mut resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GithubError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let (chunks, decoder) = spawn_gunzip(dest.to_path_buf());
        let mut compressed = 0u64;

        while let Some(chunk) = resp.chunk().await? {
            compressed += chunk.len() as u64;
            // A closed queue means the decoder failed; its error is reported below.
            if chunks.send(chunk.to_vec()).await.is_err() {
                break;
            }
        }
        drop(chunks);

        decoder
            .await
            .map_err(|e| GithubError::Io(std::io::Error::other(e)))??;

        tracing::info!(
            url = url.as_str(),
            compressed_bytes = compressed,
            path = %dest.display(),
            "Downloaded and extracted archive"
        );
        Ok(compressed)
    }
}

/// Decode gzip chunks into `dest` on the blocking pool until the sender is
/// dropped. Concatenated gzip members are decoded back to back.
fn spawn_gunzip(dest: PathBuf) -> (mpsc::Sender<Vec<u8>>, JoinHandle<std::io::Result<()>>) {
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(CHUNK_QUEUE);
    let handle = tokio::task::spawn_blocking(move || {
        let file = File::create(&dest)?;
        let mut decoder = MultiGzDecoder::new(BufWriter::new(file));
        while let Some(chunk) = rx.blocking_recv() {
            decoder.write_all(&chunk)?;
        }
        let mut out = decoder.finish()?;
        out.flush()
    });
    (tx, handle)
}

use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::core::error::{SyncError, SyncResult};

/// A single file to download with optional SHA-1 for validation.
#[derive(Debug, Clone)]
pub struct DownloadEntry {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
}

/// Bounded-retry downloader with an "already exists → skip" short-circuit.
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads in a batch.
    concurrency: usize,
    /// Attempts per file before giving up. A 404 is never retried.
    max_attempts: u32,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: 8,
            max_attempts: 3,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    // ── Single file download ────────────────────────────

    /// Download a single file to `dest`, optionally validating SHA-1.
    ///
    /// A file already present at `dest` is assumed equivalent and skipped.
    /// Transient failures are retried up to `max_attempts`; a 404 is
    /// treated as permanent and fails immediately.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> SyncResult<()> {
        info!("Downloading '{}' to '{}'...", url, dest.display());
        if dest.exists() {
            info!("File already exists, assuming equivalence and skipping download...");
            return Ok(());
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::io(parent, e))?;
        }

        for attempt in 1..=self.max_attempts {
            match self.try_download(url, dest, sha1_expected).await {
                Ok(()) => return Ok(()),
                Err(e @ SyncError::DownloadFailed { status: 404, .. }) => {
                    error!("'{}' could not be found on the server, cancelling download.", url);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Failed to download file on attempt #{}: {}", attempt, e);
                }
            }
        }

        error!("Failed to download file after {} attempts.", self.max_attempts);
        Err(SyncError::DownloadExhausted {
            url: url.to_string(),
            attempts: self.max_attempts,
        })
    }

    async fn try_download(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> SyncResult<()> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        // Validate SHA-1 before writing (compute on the in-memory buffer)
        if let Some(expected) = sha1_expected {
            let mut hasher = Sha1::new();
            hasher.update(&bytes);
            let actual = hex::encode(hasher.finalize());
            if actual != expected {
                return Err(SyncError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        // Write inside a block so the handle is dropped immediately; a held
        // handle blocks later renames on Windows.
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| SyncError::io(dest, e))?;
            file.write_all(&bytes)
                .await
                .map_err(|e| SyncError::io(dest, e))?;
            file.flush().await.map_err(|e| SyncError::io(dest, e))?;
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download many files concurrently using `buffer_unordered`.
    ///
    /// Every entry is attempted; the list of failures is returned rather than
    /// aborting on the first one. Destinations are expected to be disjoint.
    pub async fn download_batch(
        &self,
        entries: Vec<DownloadEntry>,
    ) -> Vec<(DownloadEntry, SyncError)> {
        info!(
            "Starting batch download: {} files, concurrency={}",
            entries.len(),
            self.concurrency
        );

        let results: Vec<_> = stream::iter(entries)
            .map(|entry| async move {
                let result = self
                    .download_file(&entry.url, &entry.dest, entry.sha1.as_deref())
                    .await;
                (entry, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(entry, result)| match result {
                Ok(()) => None,
                Err(e) => Some((entry, e)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_http_client;

    #[tokio::test]
    async fn existing_destination_short_circuits_without_network() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("artifact.jar");
        std::fs::write(&dest, "cached").unwrap();

        // The URL is unroutable; success proves the request was never made.
        let downloader = Downloader::new(build_http_client().unwrap());
        downloader
            .download_file("http://127.0.0.1:1/artifact.jar", &dest, None)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "cached");
    }

    #[tokio::test]
    async fn unreachable_host_exhausts_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("artifact.jar");

        let downloader = Downloader::new(build_http_client().unwrap()).with_max_attempts(2);
        let err = downloader
            .download_file("http://127.0.0.1:1/artifact.jar", &dest, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::DownloadExhausted { attempts: 2, .. }
        ));
        assert!(!dest.exists());
    }
}

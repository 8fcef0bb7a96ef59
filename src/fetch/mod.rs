//! Concurrent downloads with per-item failure isolation.

use crate::provider::DownloadJob;
use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use scenegrab_db::SeenLedger;
use scenegrab_parser::CanonicalKey;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

/// Bytes copied from the response stream per write.
const CHUNK_SIZE: usize = 8 * 1024;

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    AlreadyPresent(PathBuf),
    Failed { path: PathBuf, error: String },
}

/// Summary of one orchestrator run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub downloaded: Vec<PathBuf>,
    pub already_present: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl FetchReport {
    fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Downloaded { path, .. } => self.downloaded.push(path),
            FetchOutcome::AlreadyPresent(path) => self.already_present.push(path),
            FetchOutcome::Failed { path, error } => self.failed.push((path, error)),
        }
    }

    pub fn total(&self) -> usize {
        self.downloaded.len() + self.already_present.len() + self.failed.len()
    }
}

/// One file to fetch with every release key that resolved to it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchItem {
    job: DownloadJob,
    release_keys: Vec<CanonicalKey>,
}

/// Collapse jobs sharing a local path into one item, keeping the first job's
/// URL and the release keys of all of them.
fn merge_by_path(jobs: Vec<DownloadJob>) -> Vec<FetchItem> {
    let mut items: Vec<FetchItem> = Vec::with_capacity(jobs.len());
    let mut by_path: HashMap<PathBuf, usize> = HashMap::new();

    for job in jobs {
        let release_key = job.release_key.clone();
        let index = match by_path.get(&job.local_path) {
            Some(&index) => index,
            None => {
                by_path.insert(job.local_path.clone(), items.len());
                items.push(FetchItem {
                    job,
                    release_keys: Vec::new(),
                });
                items.len() - 1
            }
        };
        let keys = &mut items[index].release_keys;
        if let Some(key) = release_key.filter(|key| !keys.contains(key)) {
            keys.push(key);
        }
    }
    items
}

pub struct FetchOrchestrator {
    client: Client,
    ledger: Arc<dyn SeenLedger>,
    max_concurrent: usize,
}

impl FetchOrchestrator {
    pub fn new(client: Client, ledger: Arc<dyn SeenLedger>, max_concurrent: usize) -> Self {
        Self {
            client,
            ledger,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Download every job, commit keys of the ones that land, then compact
    /// the ledger.
    ///
    /// Jobs sharing a local path are fetched once; the release keys of all
    /// of them are committed with it.
    pub async fn run(&self, jobs: Vec<DownloadJob>) -> FetchReport {
        let items = merge_by_path(jobs);

        tracing::info!(
            "Fetching {} file(s), up to {} at a time",
            items.len(),
            self.max_concurrent
        );

        let outcomes: Vec<FetchOutcome> = stream::iter(items)
            .map(|item| self.fetch_one(item))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut report = FetchReport::default();
        for outcome in outcomes {
            report.record(outcome);
        }

        if let Err(e) = self.ledger.compact() {
            tracing::error!("Failed to compact ledger: {}", e);
        }

        report
    }

    async fn fetch_one(&self, item: FetchItem) -> FetchOutcome {
        let path = item.job.local_path.clone();

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!("{:?} already exists, marking seen", path);
            self.commit(&item);
            return FetchOutcome::AlreadyPresent(path);
        }

        match self.download(&item.job.url, &path).await {
            Ok(bytes) => {
                tracing::info!("Downloaded {:?} ({} bytes)", path, bytes);
                self.commit(&item);
                FetchOutcome::Downloaded { path, bytes }
            }
            Err(e) => {
                tracing::warn!("Download of {:?} failed: {:#}", path, e);
                FetchOutcome::Failed {
                    path,
                    error: format!("{:#}", e),
                }
            }
        }
    }

    fn commit(&self, item: &FetchItem) {
        let now = Utc::now();
        let keys = std::iter::once(&item.job.seen_key).chain(&item.release_keys);
        for key in keys {
            if let Err(e) = self.ledger.insert(key, now) {
                tracing::error!("Failed to mark {} seen: {}", key, e);
            }
        }
    }

    /// Stream `url` into `<path>.part`, then rename into place.
    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context(format!("Failed to GET {}", url))?;

        if response.status() != StatusCode::OK {
            anyhow::bail!("{} returned {}", url, response.status());
        }

        let part = part_path(path);
        let result = stream_to_file(response, &part).await;
        match result {
            Ok(bytes) => {
                tokio::fs::rename(&part, path)
                    .await
                    .with_context(|| format!("Failed to move {:?} into place", part))?;
                Ok(bytes)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}

async fn stream_to_file(response: reqwest::Response, part: &Path) -> Result<u64> {
    let body = response.bytes_stream().map_err(std::io::Error::other);
    let mut reader: StreamReader<_, Bytes> = StreamReader::new(Box::pin(body));

    let mut file = tokio::fs::File::create(part)
        .await
        .with_context(|| format!("Failed to create {:?}", part))?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf).await.context("Download interrupted")?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).await?;
        total += n as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(total)
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

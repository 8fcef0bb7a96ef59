//! One pass: feed, filter, link and download resolution, fetch.

use crate::config::{resolve_credentials, Config};
use crate::feed::load_announcements;
use crate::fetch::{FetchOrchestrator, FetchReport};
use crate::filter::{CommitPolicy, ReleaseFilter};
use crate::provider::{DownloadJob, DownloadResolver, HostingProvider, LinkOutcome, NitroflareClient};
use crate::render::{HttpPageRenderer, LinkResolver, PageRenderer};
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use scenegrab_db::{open_ledger, SeenLedger};
use scenegrab_parser::{Stoplist, WatchList};
use std::sync::Arc;
use std::time::Duration;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP session shared by the renderer, provider and downloads.
///
/// Only connecting is bounded here; request timeouts are applied per call.
pub fn build_session() -> Result<Client> {
    Client::builder()
        .cookie_store(true)
        .connect_timeout(CONNECTION_TIMEOUT)
        .user_agent(concat!("scenegrab/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP session")
}

/// Per-run switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Resolve only; nothing is downloaded or committed.
    pub dry_run: bool,
    /// Ignore the recency window for this run.
    pub no_window: bool,
    /// Feed source overriding `[feed] url`.
    pub feed: Option<String>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub announcements: usize,
    pub accepted: usize,
    pub skipped_links: usize,
    pub jobs: Vec<DownloadJob>,
    /// `None` on a dry run.
    pub fetch: Option<FetchReport>,
}

pub struct Pipeline {
    config: Config,
    client: Client,
    ledger: Arc<dyn SeenLedger>,
    watchlist: WatchList,
    stoplist: Arc<Stoplist>,
    renderer: Arc<dyn PageRenderer>,
    provider: Arc<dyn HostingProvider>,
}

impl Pipeline {
    /// Wire the run from configuration.
    ///
    /// Credentials are resolved before anything touches the network.
    pub fn from_config(config: Config) -> Result<Self> {
        let credentials = resolve_credentials(&config.provider)?;
        let client = build_session()?;

        let watchlist = WatchList::load(&config.filter.watchlist)
            .with_context(|| format!("Failed to load watchlist {:?}", config.filter.watchlist))?;
        if watchlist.is_empty() {
            tracing::warn!("Watchlist {:?} is empty, nothing will match", config.filter.watchlist);
        }

        let stoplist = match &config.filter.stoplist {
            Some(path) => Stoplist::load(path)
                .with_context(|| format!("Failed to load stoplist {:?}", path))?,
            None => Stoplist::default(),
        };

        let ledger = open_ledger(config.ledger.backend, &config.ledger.path)
            .with_context(|| format!("Failed to open ledger at {:?}", config.ledger.path))?;

        let renderer: Arc<dyn PageRenderer> =
            Arc::new(HttpPageRenderer::new(client.clone(), config.render.label.clone()));
        let provider: Arc<dyn HostingProvider> = Arc::new(NitroflareClient::new(
            client.clone(),
            &config.provider.api_base,
            credentials,
            Duration::from_secs(config.provider.timeout_secs),
        ));

        Ok(Self {
            config,
            client,
            ledger,
            watchlist,
            stoplist: Arc::new(stoplist),
            renderer,
            provider,
        })
    }

    pub fn ledger(&self) -> Arc<dyn SeenLedger> {
        Arc::clone(&self.ledger)
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let source = options
            .feed
            .as_deref()
            .or(self.config.feed.url.as_deref())
            .context("No feed configured; set [feed] url or pass --feed")?;

        let now = Utc::now();
        let announcements = load_announcements(&self.client, source).await?;
        let mut summary = RunSummary {
            announcements: announcements.len(),
            ..Default::default()
        };

        let window = if self.config.feed.enforce_window && !options.no_window {
            Some(recency_window(self.config.feed.recency_hours)?)
        } else {
            None
        };
        // A dry run must leave the ledger untouched
        let policy = if options.dry_run {
            CommitPolicy::OnDownload
        } else {
            self.config.download.commit_policy
        };

        let mut filter = ReleaseFilter::new(
            self.config.filter.quality_profile(),
            self.watchlist.clone(),
            Arc::clone(&self.ledger),
            policy,
        )
        .with_window(window);
        let accepted = filter.select(announcements, now);
        summary.accepted = accepted.len();

        let links = LinkResolver::new(
            Arc::clone(&self.renderer),
            Duration::from_secs(self.config.render.wait_secs),
        );
        let resolver = DownloadResolver::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.stoplist),
            self.config.paths.download_dir.clone(),
            self.config.download.organize_into_folders,
        );

        for release in &accepted {
            let share_links = links.resolve(&release.announcement.link).await;
            if share_links.is_empty() {
                tracing::warn!("No share links for {}", release.key);
                continue;
            }

            let outcomes = match resolver.resolve_release(release, &share_links).await {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    tracing::error!("Skipping release {}: {:#}", release.key, e);
                    continue;
                }
            };

            for outcome in outcomes {
                match outcome {
                    LinkOutcome::Queued(job) => summary.jobs.push(job),
                    LinkOutcome::Skipped(_) => summary.skipped_links += 1,
                }
            }
        }

        if options.dry_run {
            tracing::info!(
                "Dry run: {} accepted, {} job(s) planned",
                summary.accepted,
                summary.jobs.len()
            );
            return Ok(summary);
        }

        let orchestrator = FetchOrchestrator::new(
            self.client.clone(),
            Arc::clone(&self.ledger),
            self.config.download.max_concurrent,
        );
        let report = orchestrator.run(summary.jobs.clone()).await;

        tracing::info!(
            "Run complete: {} announcements, {} accepted, {} downloaded, {} already present, {} failed",
            summary.announcements,
            summary.accepted,
            report.downloaded.len(),
            report.already_present.len(),
            report.failed.len()
        );
        summary.fetch = Some(report);

        Ok(summary)
    }
}

fn recency_window(hours: u64) -> Result<chrono::Duration> {
    i64::try_from(hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .with_context(|| format!("feed.recency_hours {} is out of range", hours))
}

use crate::filter::CommitPolicy;
use scenegrab_db::LedgerBackend;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// RSS feed URL or local file path
    #[serde(default)]
    pub url: Option<String>,

    /// Only announcements newer than this are considered
    #[serde(default = "default_recency_hours")]
    pub recency_hours: u64,

    /// Disable to rely on the ledger alone for deduplication
    #[serde(default = "default_true")]
    pub enforce_window: bool,
}

/// Largest accepted `recency_hours`: one year.
pub const MAX_RECENCY_HOURS: u64 = 24 * 366;

fn default_recency_hours() -> u64 {
    12
}

fn default_true() -> bool {
    true
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            recency_hours: default_recency_hours(),
            enforce_window: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Resolution markers in priority order
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<String>,

    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    #[serde(default = "default_codecs")]
    pub codecs: Vec<String>,

    /// Newline-delimited show names
    #[serde(default = "default_watchlist")]
    pub watchlist: PathBuf,

    /// Newline-delimited scene tags (built-in list when unset)
    #[serde(default)]
    pub stoplist: Option<PathBuf>,
}

fn default_resolutions() -> Vec<String> {
    vec!["1080".to_string(), "2160".to_string()]
}

fn default_sources() -> Vec<String> {
    vec!["NF".to_string()]
}

fn default_codecs() -> Vec<String> {
    ["AV1", "HEVC", "X265", "H265"].iter().map(|s| s.to_string()).collect()
}

fn default_watchlist() -> PathBuf {
    PathBuf::from("tvshows.list")
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            resolutions: default_resolutions(),
            sources: default_sources(),
            codecs: default_codecs(),
            watchlist: default_watchlist(),
            stoplist: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,

    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from(".cache/seen_files")
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            path: default_ledger_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Overridden by SCENEGRAB_ACCOUNT
    #[serde(default)]
    pub account: Option<String>,

    /// Overridden by SCENEGRAB_PREMIUM_KEY
    #[serde(default)]
    pub premium_key: Option<String>,

    /// Per-request timeout for API calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://nitroflare.com/api/v2".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            account: None,
            premium_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Heading text that precedes the share-link block
    #[serde(default = "default_label")]
    pub label: String,

    /// Overall budget for fetching and scanning one landing page.
    ///
    /// Defaults to 15 seconds rather than the ~1 second a rendered page
    /// needs to settle: the landing page is fetched over HTTP, so the budget
    /// has to cover the network round-trip as well. Expiry still only means
    /// "no links" for that release.
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
}

fn default_label() -> String {
    "NitroFlare:".to_string()
}

fn default_wait_secs() -> u64 {
    15
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            wait_secs: default_wait_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Write into `<download_dir>/<Show.Name>/` instead of the top level
    #[serde(default)]
    pub organize_into_folders: bool,

    #[serde(default)]
    pub commit_policy: CommitPolicy,
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            organize_into_folders: false,
            commit_policy: CommitPolicy::default(),
        }
    }
}

use super::HostingProvider;
use crate::filter::AcceptedRelease;
use anyhow::{Context, Result};
use scenegrab_common::paths::extension_of;
use scenegrab_parser::{clean_filename, CanonicalKey, Stoplist};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Index of the file id in a `/`-split share link:
/// `https:` / `` / host / `view` / **id** / name.
///
/// Fixed by the provider's current link format.
pub const SHARE_LINK_ID_SEGMENT: usize = 4;

/// Resolution markers used to cut the provider filename, in priority order.
const NAME_RESOLUTION_MARKERS: &[&str] = &["1080", "2160", "720"];

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    pub local_path: PathBuf,
    /// Key derived from the canonical filename
    pub seen_key: CanonicalKey,
    /// Key of the release this file came from
    pub release_key: Option<CanonicalKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("no file id in share link {0}")]
    NoFileId(String),

    #[error("file info lookup failed: {0}")]
    FileInfo(String),

    #[error("download link lookup failed: {0}")]
    DownloadLink(String),

    #[error("no resolution marker in provider name {0}")]
    NoResolutionMarker(String),

    #[error("no show/episode in provider name {0}")]
    Unparseable(String),

    #[error("provider name {0} does not map to a path inside the download dir")]
    UnsafeName(String),
}

/// Result of resolving one share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Queued(DownloadJob),
    Skipped(SkipReason),
}

/// Extract the provider file id from a share link.
pub fn file_id_from_share_link(link: &str) -> Option<String> {
    link.trim()
        .split('/')
        .nth(SHARE_LINK_ID_SEGMENT)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Turns share links into download jobs through a [`HostingProvider`].
pub struct DownloadResolver {
    provider: Arc<dyn HostingProvider>,
    stoplist: Arc<Stoplist>,
    download_dir: PathBuf,
    organize_into_folders: bool,
}

impl DownloadResolver {
    pub fn new(
        provider: Arc<dyn HostingProvider>,
        stoplist: Arc<Stoplist>,
        download_dir: PathBuf,
        organize_into_folders: bool,
    ) -> Self {
        Self {
            provider,
            stoplist,
            download_dir,
            organize_into_folders,
        }
    }

    /// Resolve every share link of one release.
    ///
    /// Fails only when the provider rejects the account key, since every
    /// link would fail the same way. Per-link problems become
    /// [`LinkOutcome::Skipped`].
    pub async fn resolve_release(
        &self,
        release: &AcceptedRelease,
        links: &[String],
    ) -> Result<Vec<LinkOutcome>> {
        self.provider
            .check_key()
            .await
            .context("Provider key check failed")?;

        let mut outcomes = Vec::with_capacity(links.len());
        for link in links {
            let outcome = self.resolve_link(link, Some(&release.key)).await;
            match &outcome {
                LinkOutcome::Queued(job) => {
                    tracing::info!("Queued {:?} for {}", job.local_path, release.key)
                }
                LinkOutcome::Skipped(reason) => {
                    tracing::warn!("Skipping {} for {}: {}", link, release.key, reason)
                }
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Two-hop resolution of one link, then canonical naming.
    pub async fn resolve_link(&self, link: &str, release_key: Option<&CanonicalKey>) -> LinkOutcome {
        let Some(file_id) = file_id_from_share_link(link) else {
            return LinkOutcome::Skipped(SkipReason::NoFileId(link.to_string()));
        };

        if let Err(e) = self.provider.file_info(&file_id).await {
            return LinkOutcome::Skipped(SkipReason::FileInfo(format!("{:#}", e)));
        }

        let resolved = match self.provider.download_link(&file_id).await {
            Ok(resolved) => resolved,
            Err(e) => return LinkOutcome::Skipped(SkipReason::DownloadLink(format!("{:#}", e))),
        };

        match self.local_target(&resolved.name) {
            Ok((local_path, seen_key)) => LinkOutcome::Queued(DownloadJob {
                url: resolved.url,
                local_path,
                seen_key,
                release_key: release_key.cloned(),
            }),
            Err(reason) => LinkOutcome::Skipped(reason),
        }
    }

    /// Local path and dedup key for a provider filename.
    fn local_target(&self, provider_name: &str) -> std::result::Result<(PathBuf, CanonicalKey), SkipReason> {
        let provisional = provisional_name(provider_name)?;
        let clean = clean_filename(&provisional, &self.stoplist)
            .ok_or_else(|| SkipReason::Unparseable(provider_name.to_string()))?;

        let mut parts = vec![clean.filename.as_str()];
        if self.organize_into_folders {
            parts.insert(0, clean.folder.as_str());
        }
        if !parts.iter().all(|part| is_single_component(part)) {
            return Err(SkipReason::UnsafeName(provider_name.to_string()));
        }

        let mut path = self.download_dir.clone();
        path.extend(parts);
        Ok((path, clean.key()))
    }
}

/// A plain file or directory name: no separators, no `.` or `..`, not rooted.
fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Provider name cut at its resolution marker, with the original extension
/// re-attached.
fn provisional_name(provider_name: &str) -> std::result::Result<String, SkipReason> {
    let marker = NAME_RESOLUTION_MARKERS
        .iter()
        .find(|m| provider_name.contains(*m))
        .ok_or_else(|| SkipReason::NoResolutionMarker(provider_name.to_string()))?;

    let base = provider_name.split(marker).next().unwrap_or_default().trim();
    let extension = extension_of(provider_name)
        .ok_or_else(|| SkipReason::Unparseable(provider_name.to_string()))?;

    Ok(format!("{}.{}", base.trim_end_matches('.'), extension))
}

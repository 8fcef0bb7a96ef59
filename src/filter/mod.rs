//! Release selection: recency, quality, watchlist and ledger checks.

use chrono::{DateTime, Duration, Utc};
use scenegrab_common::RawAnnouncement;
use scenegrab_db::SeenLedger;
use scenegrab_parser::{release_test_key, sanitize, show_token, CanonicalKey, QualityProfile, WatchList};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// When a release key is written to the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// As soon as the filter accepts it. A failed download is not retried.
    OnAccept,
    /// Only after a file is written. Failed downloads are retried next run.
    #[default]
    OnDownload,
}

/// A release that passed every check, with its dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRelease {
    pub key: CanonicalKey,
    pub announcement: RawAnnouncement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Stale,
    Quality,
    NotWatched(String),
    AlreadySeen(CanonicalKey),
    DuplicateInRun(CanonicalKey),
    LedgerUnavailable,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale => write!(f, "outside recency window"),
            Self::Quality => write!(f, "quality markers missing"),
            Self::NotWatched(show) => write!(f, "{} not on watchlist", show),
            Self::AlreadySeen(key) => write!(f, "{} already seen", key),
            Self::DuplicateInRun(key) => write!(f, "{} already accepted this run", key),
            Self::LedgerUnavailable => write!(f, "ledger lookup failed"),
        }
    }
}

pub struct ReleaseFilter {
    profile: QualityProfile,
    watchlist: WatchList,
    window: Option<Duration>,
    ledger: Arc<dyn SeenLedger>,
    policy: CommitPolicy,
    claimed: HashSet<CanonicalKey>,
}

impl ReleaseFilter {
    pub fn new(
        profile: QualityProfile,
        watchlist: WatchList,
        ledger: Arc<dyn SeenLedger>,
        policy: CommitPolicy,
    ) -> Self {
        Self {
            profile,
            watchlist,
            window: Some(Duration::hours(12)),
            ledger,
            policy,
            claimed: HashSet::new(),
        }
    }

    /// Recency window; `None` disables the check.
    pub fn with_window(mut self, window: Option<Duration>) -> Self {
        self.window = window;
        self
    }

    /// Decide a single announcement, claiming its key on acceptance.
    pub fn evaluate(&mut self, announcement: &RawAnnouncement, now: DateTime<Utc>) -> Result<CanonicalKey, RejectReason> {
        if let Some(window) = self.window {
            if !announcement.is_recent(now, window) {
                return Err(RejectReason::Stale);
            }
        }

        let title = &announcement.title;
        if !self.profile.accepts(title) {
            return Err(RejectReason::Quality);
        }
        let marker = self.profile.resolution_marker(title).ok_or(RejectReason::Quality)?;

        let show = show_token(title);
        if !self.watchlist.contains(&show) {
            return Err(RejectReason::NotWatched(show));
        }

        let key = sanitize(&release_test_key(title, marker));
        if self.claimed.contains(&key) {
            return Err(RejectReason::DuplicateInRun(key));
        }
        match self.ledger.contains(&key) {
            Ok(true) => return Err(RejectReason::AlreadySeen(key)),
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Ledger lookup for {} failed: {}", key, e);
                return Err(RejectReason::LedgerUnavailable);
            }
        }

        self.claimed.insert(key.clone());
        if self.policy == CommitPolicy::OnAccept {
            if let Err(e) = self.ledger.insert(&key, now) {
                tracing::error!("Failed to mark {} seen on accept: {}", key, e);
            }
        }

        Ok(key)
    }

    /// Accepted releases, oldest announcement first.
    ///
    /// Announcements are sorted before evaluation so the earliest of any
    /// duplicates wins the claim. The sort is stable.
    pub fn select(&mut self, mut announcements: Vec<RawAnnouncement>, now: DateTime<Utc>) -> Vec<AcceptedRelease> {
        announcements.sort_by_key(|a| a.published);

        let mut accepted = Vec::new();
        for announcement in announcements {
            match self.evaluate(&announcement, now) {
                Ok(key) => {
                    tracing::info!("Accepted {} ({})", key, announcement.title);
                    accepted.push(AcceptedRelease { key, announcement });
                }
                Err(reason) => {
                    tracing::debug!("Rejected {}: {}", announcement.title, reason);
                }
            }
        }
        accepted
    }
}

//! Core types shared between the feed adapters and the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry from a release feed or scraped listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnnouncement {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
}

impl RawAnnouncement {
    pub fn new(title: impl Into<String>, link: impl Into<String>, published: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published,
        }
    }

    /// Whether this announcement was published within `window` of `now`.
    pub fn is_recent(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now - self.published <= window
    }
}

//! File-hosting provider: API client and two-hop download resolution.

mod nitroflare;
mod resolver;

pub use nitroflare::NitroflareClient;
pub use resolver::{file_id_from_share_link, DownloadJob, DownloadResolver, LinkOutcome, SkipReason};

use anyhow::Result;
use std::fmt;

/// Account name and premium key, fixed for a run.
#[derive(Clone)]
pub struct Credentials {
    account: String,
    premium_key: String,
}

impl Credentials {
    pub fn new(account: impl Into<String>, premium_key: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            premium_key: premium_key.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn premium_key(&self) -> &str {
        &self.premium_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("premium_key", &"<redacted>")
            .finish()
    }
}

/// Signed download URL plus the provider's filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub url: String,
    pub name: String,
}

/// Hosting provider resolution API
#[async_trait::async_trait]
pub trait HostingProvider: Send + Sync {
    /// Check that the account's premium key is usable
    async fn check_key(&self) -> Result<()>;

    /// Confirm the file exists on the provider
    async fn file_info(&self, file_id: &str) -> Result<()>;

    /// Exchange a file id for a signed download URL
    async fn download_link(&self, file_id: &str) -> Result<ResolvedLink>;
}

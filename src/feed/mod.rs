//! Announcement sources: RSS feeds over HTTP or from disk.

pub mod generate;
pub mod rss;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use scenegrab_common::RawAnnouncement;
use std::path::Path;

/// Load announcements from an `http(s)://` URL or a local file path.
pub async fn load_announcements(client: &Client, source: &str) -> Result<Vec<RawAnnouncement>> {
    let xml = if source.starts_with("http://") || source.starts_with("https://") {
        client
            .get(source)
            .send()
            .await
            .context(format!("Failed to fetch feed from {}", source))?
            .error_for_status()
            .context(format!("Feed {} returned an error status", source))?
            .text()
            .await
            .context("Failed to read feed body")?
    } else {
        let path = shellexpand::tilde(source);
        tokio::fs::read_to_string(Path::new(path.as_ref()))
            .await
            .with_context(|| format!("Failed to read feed file: {}", source))?
    };

    let items = rss::parse_rss(&xml, Utc::now())?;
    tracing::info!("Loaded {} announcements from {}", items.len(), source);
    Ok(items)
}

//! Build an RSS feed from a release listing page.

use super::rss::{write_rss, Channel};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use scenegrab_common::RawAnnouncement;
use scenegrab_parser::QualityProfile;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Anchors on the listing whose text passes the quality predicate, with
/// hrefs resolved against `page_url`. Duplicate links are kept once.
pub fn scrape_listing(
    html: &str,
    page_url: &Url,
    profile: &QualityProfile,
    now: DateTime<Utc>,
) -> Vec<RawAnnouncement> {
    let document = Html::parse_document(html);
    let mut seen_links = std::collections::HashSet::new();

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| {
            let text = anchor.text().collect::<String>().trim().to_string();
            if !profile.accepts(&text) {
                return None;
            }
            let href = anchor.value().attr("href")?;
            let link = page_url.join(href).ok()?;
            Some(RawAnnouncement::new(text, link.as_str(), now))
        })
        .filter(|item| seen_links.insert(item.link.clone()))
        .collect()
}

/// Fetch `page_url` and render the matching anchors as RSS 2.0.
pub async fn generate_feed(client: &Client, page_url: &str, profile: &QualityProfile) -> Result<String> {
    let url = Url::parse(page_url).with_context(|| format!("Invalid page URL: {}", page_url))?;

    let html = client
        .get(url.clone())
        .send()
        .await
        .context(format!("Failed to GET {}", url))?
        .error_for_status()?
        .text()
        .await
        .context("Failed to read listing body")?;

    let now = Utc::now();
    let items = scrape_listing(&html, &url, profile, now);
    tracing::info!("Listing {} yielded {} matching releases", url, items.len());

    let description = format!(
        "Releases matching {} / {} / {}",
        profile.resolutions.join("|"),
        profile.sources.join("|"),
        profile.codecs.join("|")
    );
    let channel = Channel {
        title: "scenegrab filtered releases",
        link: url.as_str(),
        description: &description,
    };
    write_rss(&channel, &items, now)
}

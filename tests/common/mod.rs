//! Shared test harness for integration tests.
//!
//! [`MockSite`] starts one wiremock server that plays the feed, the release
//! landing pages, the provider API and the download host, and builds a
//! [`Config`] pointing at it with a temporary download dir and ledger.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use scenegrab::config::Config;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Size of every served file; spans several copy chunks.
pub const FILE_SIZE: usize = 20_000;

/// One announced release and the file behind it.
pub struct Release {
    pub title: &'static str,
    pub file_id: &'static str,
    pub provider_name: &'static str,
}

pub const THE_SHOW: Release = Release {
    title: "The.Show.S01E02.1080p.NF.WEB-DL.HEVC",
    file_id: "FILE1",
    provider_name: "The.Show.S01E02.Pilot.Part.Two.1080p.NF.WEB-DL.HEVC.mkv",
};

pub const OTHER_SHOW: Release = Release {
    title: "Other.Show.S02E03.2160p.NF.WEB-DL.AV1",
    file_id: "FILE2",
    provider_name: "Other.Show.S02E03.2160p.NF.WEB-DL.AV1.mkv",
};

pub struct MockSite {
    pub server: MockServer,
    pub dir: TempDir,
}

impl MockSite {
    /// Serve the feed, landing pages and provider API for `releases`.
    ///
    /// Download endpoints are left to the caller so each test can set
    /// status codes and hit expectations.
    pub async fn start(releases: &[&Release]) -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join("tvshows.list"), "The Show\nOther Show\n").unwrap();

        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed_xml(&server.uri(), releases)))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v2/getKeyInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "success",
                "result": {"status": "active"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v2/getFileInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "success",
                "result": {"files": {}}
            })))
            .mount(&server)
            .await;

        for release in releases {
            Mock::given(method("GET"))
                .and(path(format!("/release/{}", release.file_id)))
                .respond_with(ResponseTemplate::new(200).set_body_string(landing_page(&server.uri(), release)))
                .mount(&server)
                .await;

            Mock::given(method("GET"))
                .and(path("/api/v2/getDownloadLink"))
                .and(query_param("file", release.file_id))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "type": "success",
                    "result": {
                        "name": release.provider_name,
                        "url": format!("{}/dl/{}", server.uri(), release.file_id)
                    }
                })))
                .mount(&server)
                .await;
        }

        Self { server, dir }
    }

    /// Serve a download with `status`, expecting exactly `hits` requests.
    pub async fn serve_download(&self, release: &Release, status: u16, hits: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/dl/{}", release.file_id)))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(vec![b'x'; FILE_SIZE]))
            .expect(hits)
            .mount(&self.server)
            .await;
    }

    pub fn feed_url(&self) -> String {
        format!("{}/feed.xml", self.server.uri())
    }

    pub fn download_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("downloads")
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.feed.url = Some(self.feed_url());
        config.filter.watchlist = self.dir.path().join("tvshows.list");
        config.paths.download_dir = self.download_dir();
        config.ledger.path = self.dir.path().join(".cache/seen_files");
        config.provider.api_base = format!("{}/api/v2", self.server.uri());
        config.provider.account = Some("user".to_string());
        config.provider.premium_key = Some("key".to_string());
        config.provider.timeout_secs = 5;
        config.render.wait_secs = 5;
        config
    }
}

fn feed_xml(base: &str, releases: &[&Release]) -> String {
    let published = (Utc::now() - Duration::hours(1)).to_rfc2822();
    let mut items = String::new();
    for release in releases {
        items.push_str(&format!(
            "<item><title>{}</title><link>{}/release/{}</link><pubDate>{}</pubDate></item>\n",
            release.title, base, release.file_id, published
        ));
    }
    // Never accepted: unwatched show and low quality
    items.push_str(&format!(
        "<item><title>Unknown.Show.S01E01.1080p.NF.HEVC</title><link>{}/release/none</link><pubDate>{}</pubDate></item>\n",
        base, published
    ));
    items.push_str(&format!(
        "<item><title>The.Show.S01E09.720p.HEVC</title><link>{}/release/none</link><pubDate>{}</pubDate></item>\n",
        base, published
    ));

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Releases</title>
{}</channel></rss>"#,
        items
    )
}

fn landing_page(base: &str, release: &Release) -> String {
    format!(
        r#"<html><body>
<h4 class="links">RapidGator:</h4>
<pre class="links">https://rapidgator.example/file/1/{name}</pre>
<h4 class="links">NitroFlare:</h4>
<pre class="links">
{base}/view/{id}/{name}
{base}/view/{id}/{title}.part1.rar
</pre>
</body></html>"#,
        base = base,
        id = release.file_id,
        name = release.provider_name,
        title = release.title,
    )
}

//! Pipeline integration tests
//!
//! Full runs against a wiremock site: feed, landing pages, provider API and
//! download host.

mod common;

use assert_matches::assert_matches;
use common::{MockSite, FILE_SIZE, OTHER_SHOW, THE_SHOW};
use scenegrab::filter::CommitPolicy;
use scenegrab::pipeline::{Pipeline, RunOptions};
use std::path::Path;

fn file_len(path: &Path) -> usize {
    std::fs::metadata(path).unwrap().len() as usize
}

fn no_part_files(dir: &Path) -> bool {
    walk(dir).iter().all(|p| p.extension().map_or(true, |e| e != "part"))
}

fn walk(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                out.extend(walk(&path));
            } else {
                out.push(path);
            }
        }
    }
    out
}

#[tokio::test]
async fn test_run_downloads_and_renames() {
    let site = MockSite::start(&[&THE_SHOW, &OTHER_SHOW]).await;
    site.serve_download(&THE_SHOW, 200, 1).await;
    site.serve_download(&OTHER_SHOW, 200, 1).await;

    let pipeline = Pipeline::from_config(site.config()).unwrap();
    let summary = pipeline.run(&RunOptions::default()).await.unwrap();

    assert_eq!(summary.announcements, 4);
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.jobs.len(), 2);

    let report = summary.fetch.unwrap();
    assert_eq!(report.downloaded.len(), 2);
    assert!(report.failed.is_empty());

    let first = site.download_dir().join("The.Show.S01E02.Pilot.Part.Two.mkv");
    let second = site.download_dir().join("Other.Show.S02E03.mkv");
    assert_eq!(file_len(&first), FILE_SIZE);
    assert_eq!(file_len(&second), FILE_SIZE);
    assert!(no_part_files(&site.download_dir()));

    let seen = pipeline.ledger().all().unwrap();
    assert!(seen.contains("THE.SHOW.S01E02"));
    assert!(seen.contains("OTHER.SHOW.S02E03"));
}

#[tokio::test]
async fn test_rerun_downloads_nothing() {
    let site = MockSite::start(&[&THE_SHOW, &OTHER_SHOW]).await;
    // One hit each across both runs
    site.serve_download(&THE_SHOW, 200, 1).await;
    site.serve_download(&OTHER_SHOW, 200, 1).await;

    {
        let pipeline = Pipeline::from_config(site.config()).unwrap();
        let report = pipeline.run(&RunOptions::default()).await.unwrap().fetch.unwrap();
        assert_eq!(report.downloaded.len(), 2);
    }

    let pipeline = Pipeline::from_config(site.config()).unwrap();
    let summary = pipeline.run(&RunOptions::default()).await.unwrap();
    assert_eq!(summary.accepted, 0);
    let report = summary.fetch.unwrap();
    assert_eq!(report.total(), 0);
}

#[tokio::test]
async fn test_failed_download_is_isolated() {
    let site = MockSite::start(&[&THE_SHOW, &OTHER_SHOW]).await;
    site.serve_download(&THE_SHOW, 200, 1).await;
    site.serve_download(&OTHER_SHOW, 500, 1).await;

    let pipeline = Pipeline::from_config(site.config()).unwrap();
    let report = pipeline.run(&RunOptions::default()).await.unwrap().fetch.unwrap();

    assert_eq!(report.downloaded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.contains("500"));

    assert!(site.download_dir().join("The.Show.S01E02.Pilot.Part.Two.mkv").exists());
    assert!(!site.download_dir().join("Other.Show.S02E03.mkv").exists());
    assert!(no_part_files(&site.download_dir()));

    let seen = pipeline.ledger().all().unwrap();
    assert!(seen.contains("THE.SHOW.S01E02"));
    assert!(!seen.contains("OTHER.SHOW.S02E03"));
}

#[tokio::test]
async fn test_failed_download_retried_next_run() {
    let site = MockSite::start(&[&OTHER_SHOW]).await;
    site.serve_download(&OTHER_SHOW, 500, 2).await;

    let pipeline = Pipeline::from_config(site.config()).unwrap();
    pipeline.run(&RunOptions::default()).await.unwrap();
    let report = pipeline.run(&RunOptions::default()).await.unwrap().fetch.unwrap();
    assert_eq!(report.failed.len(), 1);
}

#[tokio::test]
async fn test_on_accept_commits_even_when_download_fails() {
    let site = MockSite::start(&[&OTHER_SHOW]).await;
    site.serve_download(&OTHER_SHOW, 500, 1).await;

    let mut config = site.config();
    config.download.commit_policy = CommitPolicy::OnAccept;
    let pipeline = Pipeline::from_config(config).unwrap();

    let report = pipeline.run(&RunOptions::default()).await.unwrap().fetch.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(pipeline.ledger().all().unwrap().contains("OTHER.SHOW.S02E03"));

    let summary = pipeline.run(&RunOptions::default()).await.unwrap();
    assert_eq!(summary.accepted, 0);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let site = MockSite::start(&[&THE_SHOW, &OTHER_SHOW]).await;
    site.serve_download(&THE_SHOW, 200, 0).await;
    site.serve_download(&OTHER_SHOW, 200, 0).await;

    let mut config = site.config();
    config.download.commit_policy = CommitPolicy::OnAccept;
    let pipeline = Pipeline::from_config(config).unwrap();

    let options = RunOptions {
        dry_run: true,
        ..Default::default()
    };
    let summary = pipeline.run(&options).await.unwrap();

    assert_eq!(summary.jobs.len(), 2);
    assert_matches!(summary.fetch, None);
    assert!(!site.download_dir().exists());
    assert!(pipeline.ledger().all().unwrap().is_empty());
}

#[tokio::test]
async fn test_existing_file_is_not_refetched() {
    let site = MockSite::start(&[&THE_SHOW]).await;
    site.serve_download(&THE_SHOW, 200, 0).await;

    std::fs::create_dir_all(site.download_dir()).unwrap();
    let existing = site.download_dir().join("The.Show.S01E02.Pilot.Part.Two.mkv");
    std::fs::write(&existing, b"already here").unwrap();

    let pipeline = Pipeline::from_config(site.config()).unwrap();
    let report = pipeline.run(&RunOptions::default()).await.unwrap().fetch.unwrap();

    assert_eq!(report.already_present, vec![existing.clone()]);
    assert_eq!(std::fs::read(&existing).unwrap(), b"already here");
    assert!(pipeline.ledger().all().unwrap().contains("THE.SHOW.S01E02"));
}

#[tokio::test]
async fn test_organize_into_folders() {
    let site = MockSite::start(&[&THE_SHOW]).await;
    site.serve_download(&THE_SHOW, 200, 1).await;

    let mut config = site.config();
    config.download.organize_into_folders = true;
    let pipeline = Pipeline::from_config(config).unwrap();
    pipeline.run(&RunOptions::default()).await.unwrap();

    let path = site
        .download_dir()
        .join("The.Show")
        .join("The.Show.S01E02.Pilot.Part.Two.mkv");
    assert_eq!(file_len(&path), FILE_SIZE);
}

#[tokio::test]
async fn test_feed_override_and_missing_feed() {
    let site = MockSite::start(&[&THE_SHOW]).await;
    site.serve_download(&THE_SHOW, 200, 0).await;

    let mut config = site.config();
    config.feed.url = None;
    let pipeline = Pipeline::from_config(config).unwrap();

    let err = pipeline.run(&RunOptions::default()).await.unwrap_err();
    assert!(err.to_string().contains("No feed configured"));

    let options = RunOptions {
        dry_run: true,
        feed: Some(site.feed_url()),
        ..Default::default()
    };
    assert_eq!(pipeline.run(&options).await.unwrap().jobs.len(), 1);
}

#[tokio::test]
async fn test_sqlite_backend_rerun() {
    let site = MockSite::start(&[&THE_SHOW]).await;
    site.serve_download(&THE_SHOW, 200, 1).await;

    let mut config = site.config();
    config.ledger.backend = scenegrab_db::LedgerBackend::Sqlite;
    config.ledger.path = site.dir.path().join("seen.db");

    let pipeline = Pipeline::from_config(config.clone()).unwrap();
    pipeline.run(&RunOptions::default()).await.unwrap();
    drop(pipeline);

    let pipeline = Pipeline::from_config(config).unwrap();
    let summary = pipeline.run(&RunOptions::default()).await.unwrap();
    assert_eq!(summary.accepted, 0);
}

//! Canonical `Show.Name.SxxEyy.Episode.Title.ext` filenames.

use regex::Regex;
use scenegrab_common::paths::is_video_extension;
use std::sync::LazyLock;

use crate::casing::case_token;
use crate::key::{fold_separators, sanitize, CanonicalKey, SEASON_EPISODE, SPECIALS_SENTINEL};
use crate::lists::Stoplist;

static RESOLUTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d{3,4}[pi]$").unwrap());
static TOKEN_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[._\s]+").unwrap());
static DOT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

/// Folder and filename derived from a raw release filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanFilename {
    /// Dot-joined show name, e.g. `Breaking.Bad`.
    pub folder: String,
    /// Full canonical filename including extension.
    pub filename: String,
    /// Uppercase season/episode token, `S00E00` for specials.
    pub season_episode: String,
}

impl CleanFilename {
    /// Dedup key for the file: folder joined with the season/episode token.
    pub fn key(&self) -> CanonicalKey {
        sanitize(&format!("{}.{}", self.folder, self.season_episode))
    }
}

/// Derive a canonical folder and filename from a raw filename.
///
/// Returns `None` when the name carries no season/episode token or no show
/// name precedes it. Path separators split tokens like dots do, so the
/// result is always a single path component.
pub fn clean_filename(raw: &str, stoplist: &Stoplist) -> Option<CleanFilename> {
    let raw = raw.trim();
    let (stem, extension) = match raw.rsplit_once('.') {
        Some((stem, ext)) if is_plain_extension(ext) => (stem, Some(ext.to_lowercase())),
        _ => (raw, None),
    };
    let normalized = fold_separators(stem);

    let m = SEASON_EPISODE.find(&normalized)?;
    let season_episode = m.as_str().to_uppercase();

    let show_tokens: Vec<String> = tokens(&normalized[..m.start()])
        .map(case_token)
        .collect();
    if show_tokens.is_empty() {
        return None;
    }
    let folder = show_tokens.join(".");

    let title_tokens = tokens(&normalized[m.end()..])
        .take_while(|token| !ends_title(token, stoplist))
        .map(case_token);

    let mut parts = vec![folder.clone()];
    if season_episode != SPECIALS_SENTINEL {
        parts.push(season_episode.clone());
    }
    parts.extend(title_tokens);
    if let Some(ext) = extension {
        parts.push(ext);
    }

    let filename = DOT_RUNS.replace_all(&parts.join("."), ".").into_owned();

    Some(CleanFilename {
        folder,
        filename,
        season_episode,
    })
}

fn is_plain_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    TOKEN_SPLIT.split(text).filter(|t| !t.is_empty())
}

/// Scene tags, container extensions and resolution tokens all end an
/// episode title.
fn ends_title(token: &str, stoplist: &Stoplist) -> bool {
    stoplist.contains(token) || is_video_extension(token) || RESOLUTION_TOKEN.is_match(token)
}

//! Newline-delimited list files: scene-tag stoplist and watchlist.
//!
//! Both formats ignore blank lines and lines starting with `#`.

use scenegrab_common::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Scene tags used when no stoplist file is configured.
const DEFAULT_SCENE_TAGS: &[&str] = &[
    "web", "dl", "webdl", "webrip", "hdtv", "bluray", "brrip", "bdrip", "dvdrip", "remux",
    "x264", "x265", "h264", "h265", "hevc", "avc", "av1", "10bit", "hdr", "hdr10", "dv",
    "nf", "amzn", "dsnp", "hmax", "atvp", "hulu", "pcok", "ddp", "ddp5", "dd5", "aac",
    "aac2", "eac3", "atmos", "repack", "proper", "internal", "rmteam", "ntb", "flux",
    "successfulcrab", "megusta", "edith", "elite", "ethel",
];

fn entries(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn read_list(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::not_found(format!("{}", path.display()))
        } else {
            Error::Io(e)
        }
    })
}

/// Lowercase scene tags that end an episode title.
#[derive(Debug, Clone)]
pub struct Stoplist {
    tags: HashSet<String>,
}

impl Stoplist {
    pub fn parse(text: &str) -> Self {
        Self {
            tags: entries(text).map(str::to_lowercase).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        read_list(path).map(|text| Self::parse(&text))
    }

    /// Case-insensitive membership.
    pub fn contains(&self, token: &str) -> bool {
        self.tags.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for Stoplist {
    fn default() -> Self {
        Self {
            tags: DEFAULT_SCENE_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Uppercase show identifiers the operator wants downloaded.
///
/// Entries are uppercased and have spaces folded to dots so they compare
/// equal to [`crate::show_token`] output.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    shows: HashSet<String>,
}

impl WatchList {
    pub fn parse(text: &str) -> Self {
        Self {
            shows: entries(text).map(normalize_show).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        read_list(path).map(|text| Self::parse(&text))
    }

    pub fn contains(&self, show: &str) -> bool {
        self.shows.contains(show)
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for WatchList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            shows: iter.into_iter().map(|s| normalize_show(s.as_ref())).collect(),
        }
    }
}

fn normalize_show(name: &str) -> String {
    crate::key::fold_separators(&name.trim().to_uppercase())
}

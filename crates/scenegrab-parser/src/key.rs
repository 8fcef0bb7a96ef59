//! Canonical keys used for deduplication.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Season/episode token for specials and movies.
pub const SPECIALS_SENTINEL: &str = "S00E00";

pub(crate) static SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)S\d{2,3}E\d{2}").unwrap());

/// Normalized show + season/episode identity.
///
/// Only constructible through [`sanitize`], so the inner text is always
/// uppercase and space-free, and equality is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The season/episode token, when present.
    pub fn season_episode(&self) -> Option<&str> {
        SEASON_EPISODE.find(&self.0).map(|m| m.as_str())
    }

    /// Show-name run preceding the season/episode token, dots trimmed.
    ///
    /// Keys without a season/episode token are all show.
    pub fn show(&self) -> &str {
        let end = SEASON_EPISODE
            .find(&self.0)
            .map(|m| m.start())
            .unwrap_or(self.0.len());
        self.0[..end].trim_matches('.')
    }

    pub fn is_special(&self) -> bool {
        self.season_episode() == Some(SPECIALS_SENTINEL)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize free text into a canonical key.
///
/// The text is trimmed, uppercased and has spaces folded to dots. When a
/// season/episode token is present, everything after it is dropped.
///
/// ```
/// use scenegrab_parser::sanitize;
///
/// assert_eq!(sanitize("high potential s01e13 lets play").as_str(), "HIGH.POTENTIAL.S01E13");
/// assert_eq!(sanitize("DUPAHIYA.S01.1080p").as_str(), "DUPAHIYA.S01.1080P");
/// ```
pub fn sanitize(text: &str) -> CanonicalKey {
    let folded = text.trim().to_uppercase().replace(' ', ".");
    match SEASON_EPISODE.find(&folded) {
        Some(m) => CanonicalKey(folded[..m.end()].to_string()),
        None => CanonicalKey(folded),
    }
}

/// Show identifier used for watchlist matching.
///
/// Separators are folded to dots and the run before the first
/// season/episode token is returned uppercase, minus any leading bracketed
/// group tags. Titles without a token fall back to the whole uppercased
/// title. Bracketed text after the show name, such as a trailing `[eztv]`,
/// never affects the result.
pub fn show_token(title: &str) -> String {
    let folded = fold_separators(&title.trim().to_uppercase());
    let show = match SEASON_EPISODE.find(&folded) {
        Some(m) => &folded[..m.start()],
        None => folded.as_str(),
    };
    strip_bracket_prefix(show).trim_matches('.').to_string()
}

/// Drop leading `[...]` groups along with the dots and spaces around them.
pub(crate) fn strip_bracket_prefix(mut text: &str) -> &str {
    loop {
        text = text.trim_start_matches(|c: char| c == '.' || c.is_whitespace());
        match text.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
            Some((_, rest)) => text = rest,
            None => return text,
        }
    }
}

/// Replace `_`, `-`, path separators and whitespace with dots.
pub(crate) fn fold_separators(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '_' | '-' | '/' | '\\' => '.',
            c if c.is_whitespace() => '.',
            c => c,
        })
        .collect()
}

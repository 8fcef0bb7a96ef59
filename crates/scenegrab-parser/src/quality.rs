//! Quality predicate over release titles.

use crate::key::strip_bracket_prefix;

/// Required resolution, source and codec markers.
///
/// Resolution markers are matched as substrings (`1080` inside `1080p`) and
/// tried in list order. Source and codec markers must appear as whole tokens
/// so `NF` does not match inside `INFO`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityProfile {
    pub resolutions: Vec<String>,
    pub sources: Vec<String>,
    pub codecs: Vec<String>,
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self {
            resolutions: vec!["1080".into(), "2160".into()],
            sources: vec!["NF".into()],
            codecs: vec!["AV1".into(), "HEVC".into(), "X265".into(), "H265".into()],
        }
    }
}

impl QualityProfile {
    pub fn new(resolutions: Vec<String>, sources: Vec<String>, codecs: Vec<String>) -> Self {
        let upper = |v: Vec<String>| v.into_iter().map(|s| s.to_uppercase()).collect();
        Self {
            resolutions: upper(resolutions),
            sources: upper(sources),
            codecs: upper(codecs),
        }
    }

    /// First resolution marker present in the title, in priority order.
    pub fn resolution_marker(&self, title: &str) -> Option<&str> {
        let upper = title.to_uppercase();
        self.resolutions
            .iter()
            .find(|marker| upper.contains(marker.as_str()))
            .map(String::as_str)
    }

    /// Resolution, source and at least one codec marker are all present.
    pub fn accepts(&self, title: &str) -> bool {
        let upper = title.to_uppercase();
        let tokens: Vec<&str> = upper
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        let has_token = |markers: &[String]| markers.iter().any(|m| tokens.contains(&m.as_str()));

        self.resolution_marker(title).is_some() && has_token(&self.sources) && has_token(&self.codecs)
    }
}

/// Text of the title preceding `marker`, with leading bracketed group tags
/// removed.
///
/// ```
/// use scenegrab_parser::release_test_key;
///
/// assert_eq!(release_test_key("[TGx] The.Show.S01E02.1080p.NF", "1080"), "THE.SHOW.S01E02.");
/// ```
pub fn release_test_key(title: &str, marker: &str) -> String {
    let upper = title.to_uppercase();
    let marker = marker.to_uppercase();
    let before = upper.split(marker.as_str()).next().unwrap_or_default().trim();
    strip_bracket_prefix(before).trim().to_string()
}

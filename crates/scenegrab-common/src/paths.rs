//! Extension helpers for media files and provider share-links.

/// Video container extensions. Also the tokens that end an episode title.
const VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "mkv", "mpeg", "mp4", "m4v", "mpg", "mov", "webm", "avif", "ts",
];

/// Markers a share-link must carry to be worth resolving.
const MEDIA_MARKERS: &[&str] = &[".MP4", ".MKV", ".MOV", ".MPG", ".WEBM"];

/// Check a bare token (no dot) against the video extension list, ignoring case.
pub fn is_video_extension(token: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&token.to_lowercase().as_str())
}

/// Whether a share-link or line of text names a media file.
///
/// ```
/// use scenegrab_common::paths::has_media_marker;
///
/// assert!(has_media_marker("https://host/view/X1/show.webm"));
/// assert!(!has_media_marker("https://host/view/X1/show.rar"));
/// ```
pub fn has_media_marker(text: &str) -> bool {
    let upper = text.to_uppercase();
    MEDIA_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// Lowercase text after the last `.` of a filename, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

//! # scenegrab-parser
//!
//! Normalization of noisy release titles into canonical episode keys and
//! filenames.
//!
//! ## Quick Start
//!
//! ```
//! use scenegrab_parser::{clean_filename, sanitize, Stoplist};
//!
//! let key = sanitize("The Show S01E02 1080p NF WEB-DL HEVC");
//! assert_eq!(key.as_str(), "THE.SHOW.S01E02");
//!
//! let stoplist = Stoplist::parse("bluray\nx264\n");
//! let clean = clean_filename("breaking.bad.s02e05.1080p.bluray.x264.mkv", &stoplist).unwrap();
//! assert_eq!(clean.folder, "Breaking.Bad");
//! assert_eq!(clean.filename, "Breaking.Bad.S02E05.mkv");
//! ```
//!
//! Nothing in this crate performs I/O apart from the list loaders.

mod casing;
mod filename;
mod key;
pub mod lists;
pub mod quality;

pub use filename::{clean_filename, CleanFilename};
pub use key::{sanitize, show_token, CanonicalKey, SPECIALS_SENTINEL};
pub use lists::{Stoplist, WatchList};
pub use quality::{release_test_key, QualityProfile};

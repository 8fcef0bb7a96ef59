//! Scenegrab-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across scenegrab:
//!
//! - **Core Types**: Announcements as produced by feed adapters
//! - **Path Utilities**: Media extension and share-link marker checks
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use scenegrab_common::{Error, Result};
//! use scenegrab_common::paths::has_media_marker;
//!
//! assert!(has_media_marker("https://host/view/ABC/Show.S01E01.mkv"));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("ledger"))
//! }
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

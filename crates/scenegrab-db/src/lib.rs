//! Scenegrab-DB: persistent seen-ledger storage
//!
//! The [`SeenLedger`] trait is the contract the pipeline depends on; two
//! backends implement it.
//!
//! # Modules
//!
//! - `ledger` - The ledger trait and backend selection
//! - `flat_file` - Newline-delimited key file, append-only between compactions
//! - `sqlite` - SQLite table via rusqlite and r2d2
//! - `pool` - Connection pool management
//! - `migrations` - SQLite schema migrations
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use scenegrab_db::{open_ledger, LedgerBackend};
//! use scenegrab_parser::sanitize;
//! use std::path::Path;
//!
//! let ledger = open_ledger(LedgerBackend::File, Path::new(".cache/seen_files")).unwrap();
//! ledger.insert(&sanitize("The Show S01E01"), Utc::now()).unwrap();
//! ```

pub mod flat_file;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod sqlite;

pub use flat_file::FlatFileLedger;
pub use ledger::{open_ledger, LedgerBackend, SeenLedger};
pub use sqlite::SqliteLedger;

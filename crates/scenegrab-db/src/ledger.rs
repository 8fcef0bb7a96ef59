//! The seen-ledger contract and backend selection.

use chrono::{DateTime, Utc};
use scenegrab_common::Result;
use scenegrab_parser::CanonicalKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::flat_file::FlatFileLedger;
use crate::sqlite::SqliteLedger;

/// Persistent set of canonical keys already handled.
///
/// Implementations serialize concurrent inserts, and a successful `insert`
/// is durable before it returns.
pub trait SeenLedger: Send + Sync {
    fn contains(&self, key: &CanonicalKey) -> Result<bool>;

    /// Record `key`. Returns `false` when it was already present.
    fn insert(&self, key: &CanonicalKey, seen_at: DateTime<Utc>) -> Result<bool>;

    /// Every key, sorted.
    fn all(&self) -> Result<BTreeSet<String>>;

    /// When `key` was first recorded, for backends that keep timestamps.
    fn seen_at(&self, _key: &CanonicalKey) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }

    /// Rewrite the backing store sorted and deduplicated.
    fn compact(&self) -> Result<()>;
}

/// Which store backs the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// Newline-delimited keys, append-only between compactions.
    #[default]
    File,
    /// SQLite table with one row per key.
    Sqlite,
}

/// Open the ledger at `path` with the chosen backend.
pub fn open_ledger(backend: LedgerBackend, path: &Path) -> Result<Arc<dyn SeenLedger>> {
    tracing::debug!("Opening {:?} ledger at {:?}", backend, path);
    match backend {
        LedgerBackend::File => Ok(Arc::new(FlatFileLedger::open(path)?)),
        LedgerBackend::Sqlite => Ok(Arc::new(SqliteLedger::open(path)?)),
    }
}

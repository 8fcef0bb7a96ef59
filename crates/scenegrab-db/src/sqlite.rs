//! SQLite ledger backend.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use scenegrab_common::{Error, Result};
use scenegrab_parser::CanonicalKey;
use std::collections::BTreeSet;
use std::path::Path;

use crate::ledger::SeenLedger;
use crate::pool::{get_conn, init_memory_pool, init_pool, DbPool};

/// Ledger stored in the `seen` table, written synchronously per insert.
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let pool = init_pool(&path.to_string_lossy())?;
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            pool: init_memory_pool()?,
        })
    }
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

impl SeenLedger for SqliteLedger {
    fn contains(&self, key: &CanonicalKey) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        conn.query_row("SELECT 1 FROM seen WHERE key = ?", [key.as_str()], |_| Ok(()))
            .optional()
            .map(|row| row.is_some())
            .map_err(db_err)
    }

    fn insert(&self, key: &CanonicalKey, seen_at: DateTime<Utc>) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO seen (key, seen_at) VALUES (?, ?)",
                params![key.as_str(), seen_at.to_rfc3339()],
            )
            .map_err(db_err)?;
        Ok(changed == 1)
    }

    fn all(&self) -> Result<BTreeSet<String>> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare("SELECT key FROM seen ORDER BY key").map_err(db_err)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<BTreeSet<String>>>()
            .map_err(db_err)?;
        Ok(keys)
    }

    /// Keys are unique by primary key; compaction reclaims free pages.
    fn compact(&self) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        conn.execute_batch("VACUUM;").map_err(db_err)
    }

    fn seen_at(&self, key: &CanonicalKey) -> Result<Option<DateTime<Utc>>> {
        let conn = get_conn(&self.pool)?;
        let raw: Option<String> = conn
            .query_row("SELECT seen_at FROM seen WHERE key = ?", [key.as_str()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_err)?;

        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::database(format!("Bad timestamp for {}: {}", key, e)))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scenegrab_parser::sanitize;

    #[test]
    fn test_insert_is_idempotent() {
        let ledger = SqliteLedger::in_memory().unwrap();
        let key = sanitize("The Show S01E02");

        assert!(ledger.insert(&key, Utc::now()).unwrap());
        assert!(!ledger.insert(&key, Utc::now()).unwrap());
        assert!(ledger.contains(&key).unwrap());
        assert_eq!(ledger.all().unwrap().len(), 1);
    }

    #[test]
    fn test_first_timestamp_is_kept() {
        let ledger = SqliteLedger::in_memory().unwrap();
        let key = sanitize("Show S01E01");
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        ledger.insert(&key, first).unwrap();
        ledger.insert(&key, later).unwrap();
        assert_eq!(ledger.seen_at(&key).unwrap(), Some(first));
        assert_eq!(ledger.seen_at(&sanitize("Other S01E01")).unwrap(), None);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.db");
        let key = sanitize("Prime Target S01E05");

        {
            let ledger = SqliteLedger::open(&path).unwrap();
            ledger.insert(&key, Utc::now()).unwrap();
        }

        let reopened = SqliteLedger::open(&path).unwrap();
        assert!(reopened.contains(&key).unwrap());
        reopened.compact().unwrap();
        assert!(reopened.contains(&key).unwrap());
    }

    #[test]
    fn test_all_is_sorted() {
        let ledger = SqliteLedger::in_memory().unwrap();
        for title in ["Zed S01E01", "Alpha S01E01", "Mid S01E01"] {
            ledger.insert(&sanitize(title), Utc::now()).unwrap();
        }
        let all: Vec<String> = ledger.all().unwrap().into_iter().collect();
        assert_eq!(all, vec!["ALPHA.S01E01", "MID.S01E01", "ZED.S01E01"]);
    }
}

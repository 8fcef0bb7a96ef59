//! Flat-file ledger: an in-memory set mirrored to an append-only text file.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use scenegrab_common::Result;
use scenegrab_parser::{sanitize, CanonicalKey};
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::ledger::SeenLedger;

/// Newline-delimited ledger file.
///
/// Inserts append one line and fsync before returning. `compact` rewrites
/// the file sorted through a temporary file and rename. The flat format
/// keeps only keys; insertion timestamps are not recorded.
pub struct FlatFileLedger {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    keys: BTreeSet<String>,
    file: File,
}

impl FlatFileLedger {
    /// Load `path`, creating it (and its parent directory) when absent.
    ///
    /// Every line is re-sanitized; blank and `#` lines are skipped.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let mut content = String::new();
        file.read_to_string(&mut content)?;

        let keys: BTreeSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| sanitize(line).into_string())
            .collect();

        // Make sure the next append starts on its own line.
        if !content.is_empty() && !content.ends_with('\n') {
            file.write_all(b"\n")?;
            file.sync_data()?;
        }

        tracing::debug!("Loaded {} seen keys from {:?}", keys.len(), path);

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner { keys, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.lock().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SeenLedger for FlatFileLedger {
    fn contains(&self, key: &CanonicalKey) -> Result<bool> {
        Ok(self.inner.lock().keys.contains(key.as_str()))
    }

    fn insert(&self, key: &CanonicalKey, _seen_at: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.lock();
        if inner.keys.contains(key.as_str()) {
            return Ok(false);
        }

        let line = format!("{}\n", key);
        inner.file.write_all(line.as_bytes())?;
        inner.file.flush()?;
        inner.file.sync_data()?;

        inner.keys.insert(key.as_str().to_string());
        Ok(true)
    }

    fn all(&self) -> Result<BTreeSet<String>> {
        Ok(self.inner.lock().keys.clone())
    }

    fn compact(&self) -> Result<()> {
        let mut inner = self.inner.lock();

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            for key in &inner.keys {
                writeln!(writer, "{}", key)?;
            }
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        file.seek(SeekFrom::End(0))?;
        inner.file = file;

        tracing::debug!("Compacted ledger {:?} to {} keys", self.path, inner.keys.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_insert_then_contains() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FlatFileLedger::open(&dir.path().join("seen_files")).unwrap();
        let key = sanitize("Breaking Bad S02E05");

        assert!(!ledger.contains(&key).unwrap());
        assert!(ledger.insert(&key, Utc::now()).unwrap());
        assert!(ledger.contains(&key).unwrap());
    }

    #[test]
    fn test_reinsert_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_files");
        let ledger = FlatFileLedger::open(&path).unwrap();
        let key = sanitize("Show S01E01");

        assert!(ledger.insert(&key, Utc::now()).unwrap());
        assert!(!ledger.insert(&key, Utc::now()).unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("seen_files");
        let key = sanitize("Prime Target S01E05");

        {
            let ledger = FlatFileLedger::open(&path).unwrap();
            ledger.insert(&key, Utc::now()).unwrap();
        }

        let reopened = FlatFileLedger::open(&path).unwrap();
        assert!(reopened.contains(&key).unwrap());
    }

    #[test]
    fn test_load_sanitizes_and_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_files");
        fs::write(&path, "# header\n\nthe show s01e01 extra\nOTHER.S02E02\nOTHER.S02E02").unwrap();

        let ledger = FlatFileLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains(&sanitize("THE.SHOW.S01E01")).unwrap());

        // Missing trailing newline is repaired before the next append
        ledger.insert(&sanitize("New S01E01"), Utc::now()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("OTHER.S02E02\nNEW.S01E01\n"));
    }

    #[test]
    fn test_compact_sorts_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_files");
        fs::write(&path, "ZED.S01E01\nALPHA.S01E01\nZED.S01E01\n").unwrap();

        let ledger = FlatFileLedger::open(&path).unwrap();
        ledger.compact().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "ALPHA.S01E01\nZED.S01E01\n");

        // Appends continue after compaction
        ledger.insert(&sanitize("Mid S01E01"), Utc::now()).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "ALPHA.S01E01\nZED.S01E01\nMID.S01E01\n"
        );
    }

    #[test]
    fn test_concurrent_inserts_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_files");
        let ledger = Arc::new(FlatFileLedger::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let key = sanitize(&format!("Show{} S01E{:02}", t, i));
                        ledger.insert(&key, Utc::now()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 200);
        let reopened = FlatFileLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 200);
    }
}

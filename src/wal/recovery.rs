//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{CacheError, Result};
use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Last valid LSN (0 for an empty log)
    pub last_lsn: u64,

    /// Length in bytes of the well-formed prefix of the log
    pub valid_len: u64,

    /// Whether a torn tail was found (and, for `recover`, cut off)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries in file order
    /// 2. Stop at a torn final entry and truncate the file back to the last good one
    /// 3. Fail on corruption anywhere before the tail
    ///
    /// A missing file recovers as an empty log.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut entries = Vec::new();
        let result = Self::scan(path, |entry| entries.push(entry))?;
        Self::cut_torn_tail(path, &result)?;
        Ok((entries, result))
    }

    /// Scan the log and truncate a torn tail without keeping the entries
    pub fn repair(path: &Path) -> Result<RecoveryResult> {
        let result = Self::scan(path, |_| {})?;
        Self::cut_torn_tail(path, &result)?;
        Ok(result)
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path, |_| {})
    }

    fn scan<F: FnMut(WalEntry)>(path: &Path, mut on_entry: F) -> Result<RecoveryResult> {
        let mut reader = match WalReader::open(path) {
            Ok(reader) => reader,
            Err(CacheError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                return Ok(RecoveryResult::default());
            }
            Err(e) => return Err(e),
        };

        let mut result = RecoveryResult::default();
        while let Some(entry) = reader.next_entry()? {
            result.entries_recovered += 1;
            result.last_lsn = entry.lsn;
            on_entry(entry);
        }

        result.valid_len = reader.position();
        result.was_truncated = reader.has_torn_tail();
        Ok(result)
    }

    fn cut_torn_tail(path: &Path, result: &RecoveryResult) -> Result<()> {
        if !result.was_truncated {
            return Ok(());
        }

        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(result.valid_len)?;
        file.sync_all()?;

        tracing::info!(
            "Truncated torn WAL tail: {} now ends at byte {}",
            path.display(),
            result.valid_len
        );
        Ok(())
    }
}

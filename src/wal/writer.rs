//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{CacheError, Result};
use super::entry::{encode_frame, now_millis};
use super::{Operation, RecoveryResult, WalRecovery};

/// Writes entries to the WAL file
pub struct WalWriter {
    file: File,
    path: PathBuf,

    /// LSN assigned to the next append
    next_lsn: u64,

    /// Length of the well-formed log; failed appends roll back to it
    len: u64,

    sync_strategy: WalSyncStrategy,

    /// Entries written since the last fsync
    uncommitted: usize,

    /// Set when a failed write could not be rolled back
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// An existing log is scanned first (a torn tail is cut off) so the
    /// writer continues after the last good LSN.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let recovery = WalRecovery::repair(path)?;
        Self::resume(path, sync_strategy, &recovery)
    }

    /// Open a WAL file that has already been recovered
    pub fn resume(
        path: &Path,
        sync_strategy: WalSyncStrategy,
        recovery: &RecoveryResult,
    ) -> Result<Self> {
        let existed = path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let len = file.metadata()?.len();
        if len != recovery.valid_len {
            return Err(CacheError::WalCorruption(format!(
                "{} is {} bytes but only {} bytes were recovered",
                path.display(),
                len,
                recovery.valid_len
            )));
        }

        if !existed {
            sync_parent_dir(path)?;
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            next_lsn: recovery.last_lsn + 1,
            len,
            sync_strategy,
            uncommitted: 0,
            poisoned: false,
        })
    }

    /// Append an entry to the WAL
    ///
    /// Returns the LSN assigned to the entry. Under `EveryWrite` the entry is
    /// on stable storage when this returns.
    pub fn append(&mut self, operation: &Operation) -> Result<u64> {
        if self.poisoned {
            return Err(CacheError::WalWrite(format!(
                "{} is unusable after an earlier failed write",
                self.path.display()
            )));
        }

        let lsn = self.next_lsn;
        let frame = encode_frame(lsn, operation, now_millis())?;

        if let Err(e) = self.file.write_all(&frame) {
            self.rollback();
            return Err(CacheError::WalWrite(format!("append lsn {}: {}", lsn, e)));
        }
        self.uncommitted += 1;

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted >= count.max(1),
        };

        if should_sync {
            if let Err(e) = self.file.sync_data() {
                // Durability of everything since the last good sync is unknown.
                self.rollback();
                self.poisoned = true;
                return Err(CacheError::WalWrite(format!("sync lsn {}: {}", lsn, e)));
            }
            self.uncommitted = 0;
        }

        self.next_lsn += 1;
        self.len += frame.len() as u64;
        Ok(lsn)
    }

    fn rollback(&mut self) {
        if let Err(e) = self.file.set_len(self.len) {
            tracing::error!(
                "Failed to roll back {} to {} bytes: {}",
                self.path.display(),
                self.len,
                e
            );
            self.poisoned = true;
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        if let Err(e) = self.file.sync_data() {
            self.poisoned = true;
            return Err(CacheError::WalWrite(format!("sync: {}", e)));
        }
        self.uncommitted = 0;
        Ok(())
    }

    /// Get the LSN that the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries written but not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Length of the log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if self.uncommitted > 0 && !self.poisoned {
            if let Err(e) = self.file.sync_data() {
                tracing::warn!("Final WAL sync failed for {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Make a newly created file's directory entry durable
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

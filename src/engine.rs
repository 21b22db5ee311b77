//! Engine Module
//!
//! The core cache engine that binds the Store to the WAL.
//!
//! ## Responsibilities
//! - Replay the WAL into an empty Store on startup
//! - Log every effective mutation before it becomes visible
//! - Serve the six cache operations (plus PING) for any transport

use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Command, Response};
use crate::store::{GlobPattern, Store};
use crate::wal::{Operation, RecoveryResult, WalRecovery, WalWriter};

/// The main cache engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Mutations** (set/delete/pop): serialized by the `wal` mutex, which is
///   held across "decide effect → append to WAL → apply to Store". Two
///   concurrent POPs of one key can therefore never both see the value.
///
/// - **Reads** (get/keys/len): take only the Store's internal read lock.
///   The Store changes in a single write-locked step after the WAL append,
///   so readers never observe a half-applied mutation.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log; its lock is the critical section for all mutations
    wal: Mutex<WalWriter>,

    /// Live cache contents (internal RwLock)
    store: Store,

    /// What startup recovery found
    recovery: RecoveryResult,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// On startup:
    /// 1. Create the WAL's parent directory if needed
    /// 2. Recover entries from the WAL (cutting off a torn tail)
    /// 3. Replay them into an empty Store
    /// 4. Resume the WAL writer after the last recovered LSN
    pub fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.wal_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Store::new();
        let (entries, recovery) = WalRecovery::recover(&config.wal_path)?;

        for entry in entries {
            apply(&store, entry.operation);
        }

        tracing::info!(
            "WAL recovery from {}: {} entries replayed, {} keys live, last_lsn={}{}",
            config.wal_path.display(),
            recovery.entries_recovered,
            store.len(),
            recovery.last_lsn,
            if recovery.was_truncated { " (torn tail discarded)" } else { "" }
        );

        let wal = WalWriter::resume(&config.wal_path, config.wal_sync_strategy, &recovery)?;

        Ok(Self {
            config,
            wal: Mutex::new(wal),
            store,
            recovery,
        })
    }

    /// Open with a WAL path (convenience method)
    ///
    /// Uses default config with the specified WAL file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().wal_path(path).build();
        Self::open(config)
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Response> {
        let response = match command {
            Command::Get { key } => Response::value_or_nil(self.get(&key)),
            Command::Set { key, value } => {
                self.set(key, value)?;
                Response::Ok
            }
            Command::Delete { key } => Response::Integer(self.delete(&key)? as i64),
            Command::Pop { key } => Response::value_or_nil(self.pop(&key)?),
            Command::Keys { pattern } => Response::Keys(self.keys(&pattern)),
            Command::Len => Response::Integer(self.len() as i64),
            Command::Ping => Response::Value(b"PONG".to_vec()),
        };
        Ok(response)
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.store.get(key)
    }

    /// Insert or overwrite a key
    ///
    /// The SET is on the WAL before the new value is visible.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Result<()> {
        let operation = Operation::Set {
            key: key.into(),
            value: value.into(),
        };

        let mut wal = self.wal.lock();
        let lsn = wal.append(&operation)?;
        tracing::trace!("SET {} (lsn {})", operation.key(), lsn);
        apply(&self.store, operation);
        Ok(())
    }

    /// Delete a key
    ///
    /// Returns 1 if the key was removed, 0 if it was absent. Only an
    /// effective delete is logged.
    pub fn delete(&self, key: &str) -> Result<usize> {
        let mut wal = self.wal.lock();
        if !self.store.contains(key) {
            return Ok(0);
        }

        let operation = Operation::Delete {
            key: key.to_string(),
        };
        let lsn = wal.append(&operation)?;
        tracing::trace!("DEL {} (lsn {})", key, lsn);

        Ok(apply(&self.store, operation).is_some() as usize)
    }

    /// Read and remove a key in one step
    ///
    /// Of any number of concurrent callers, exactly one receives the value.
    /// Only a POP that returns a value is logged.
    pub fn pop(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut wal = self.wal.lock();
        if !self.store.contains(key) {
            return Ok(None);
        }

        let operation = Operation::Pop {
            key: key.to_string(),
        };
        let lsn = wal.append(&operation)?;
        tracing::trace!("POP {} (lsn {})", key, lsn);

        Ok(apply(&self.store, operation))
    }

    /// List keys matching a glob pattern
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        self.store.keys_matching(&GlobPattern::new(pattern))
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Force the WAL to stable storage
    pub fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }

    /// Close the engine gracefully
    ///
    /// Syncs any batched WAL entries to disk
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the WAL file path
    pub fn wal_path(&self) -> &Path {
        &self.config.wal_path
    }

    /// LSN the next mutation will receive
    pub fn current_lsn(&self) -> u64 {
        self.wal.lock().current_lsn()
    }

    /// Approximate bytes held by the Store
    pub fn store_size(&self) -> usize {
        self.store.size()
    }

    /// What startup recovery found
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Apply a logged operation to the Store, returning any removed value
fn apply(store: &Store, operation: Operation) -> Option<Vec<u8>> {
    match operation {
        Operation::Set { key, value } => {
            store.insert(key, value);
            None
        }
        Operation::Delete { key } | Operation::Pop { key } => store.remove(&key),
    }
}

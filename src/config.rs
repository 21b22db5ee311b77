//! Configuration for tiny-mp-cache
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::network::Endpoint;

/// Default WAL file name, relative to the working directory
pub const DEFAULT_WAL_PATH: &str = "tiny-mp-cache.wal";

/// Default TCP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5002";

/// Main configuration for a cache instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Path of the write-ahead log file (one per server instance)
    pub wal_path: PathBuf,

    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Endpoints to serve, TCP and/or Unix-domain sockets
    pub listen: Vec<Endpoint>,

    /// Max concurrent client connections (per listener)
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (a crash may lose up to N-1 entries)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_path: PathBuf::from(DEFAULT_WAL_PATH),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            listen: vec![Endpoint::Tcp(DEFAULT_LISTEN_ADDR.to_string())],
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    listen_overridden: bool,
}

impl ConfigBuilder {
    /// Set the WAL file path
    pub fn wal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_path = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Add an endpoint to listen on
    ///
    /// The first call replaces the default TCP endpoint.
    pub fn listen(mut self, endpoint: Endpoint) -> Self {
        if !self.listen_overridden {
            self.config.listen.clear();
            self.listen_overridden = true;
        }
        self.config.listen.push(endpoint);
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

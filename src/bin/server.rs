//! tiny-mp-cache Server Binary
//!
//! Replays the WAL, then serves every configured endpoint from one engine.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tiny_mp_cache::config::{WalSyncStrategy, DEFAULT_LISTEN_ADDR, DEFAULT_WAL_PATH};
use tiny_mp_cache::network::Server;
use tiny_mp_cache::{Config, Endpoint, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// tiny-mp-cache Server
#[derive(Parser, Debug)]
#[command(name = "tiny-mp-cache-server")]
#[command(about = "Multi-process key-value cache with WAL durability")]
#[command(version)]
struct Args {
    /// Write-ahead log file
    #[arg(short, long, default_value = DEFAULT_WAL_PATH)]
    wal: PathBuf,

    /// Endpoint to serve: host:port, tcp://host:port or unix:///path (repeatable)
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR, value_parser = Endpoint::parse)]
    listen: Vec<Endpoint>,

    /// Maximum concurrent connections per endpoint
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// fsync the WAL every N entries instead of after every write
    #[arg(long)]
    sync_every: Option<usize>,

    /// Connection read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Connection write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tiny_mp_cache=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("tiny-mp-cache Server v{}", tiny_mp_cache::VERSION);
    tracing::info!("WAL file: {}", args.wal.display());

    let sync_strategy = match args.sync_every {
        Some(count) if count > 1 => WalSyncStrategy::EveryNEntries { count },
        _ => WalSyncStrategy::EveryWrite,
    };

    // Build config from args
    let config = args
        .listen
        .iter()
        .cloned()
        .fold(Config::builder(), |builder, endpoint| builder.listen(endpoint))
        .wal_path(&args.wal)
        .wal_sync_strategy(sync_strategy)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    // Open engine (replays the WAL before anything is bound)
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized with {} keys", engine.len());

    let mut handles = Vec::with_capacity(config.listen.len());
    for endpoint in &config.listen {
        let spawned = Server::bind(endpoint, &config, Arc::clone(&engine))
            .and_then(|server| server.spawn());
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                tracing::error!("Failed to serve {}: {}", endpoint, e);
                std::process::exit(1);
            }
        }
    }

    for handle in handles {
        let endpoint = handle.endpoint().clone();
        if let Err(e) = handle.join() {
            tracing::error!("Server on {} failed: {}", endpoint, e);
            std::process::exit(1);
        }
    }

    tracing::info!("Server stopped");
}

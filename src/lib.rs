//! # tiny-mp-cache
//!
//! A process-wide key-value cache shared by many client processes, with:
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery with torn-write handling
//! - Atomic POP for exactly-once job consumption
//! - Identical service over TCP and Unix-domain sockets
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │       TCP Listener       │   │   Unix Socket Listener   │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              │  one thread per connection    │
//! ┌────────────▼───────────────────────────────▼─────────────┐
//! │                     Command Protocol                     │
//! └─────────────────────────────┬────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼────────────────────────────┐
//! │                          Engine                          │
//! │            (Single Writer / Multi Reader)                │
//! └─────────────────────────────┬────────────────────────────┘
//!                               │
//!          ┌────────────────────┴────────────────────┐
//!          │                                         │
//!          ▼                                         ▼
//!   ┌─────────────┐                           ┌─────────────┐
//!   │     WAL     │                           │    Store    │
//!   │  (Append)   │                           │  (RwLock)   │
//!   └─────────────┘                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod store;
pub mod network;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CacheError, Result};
pub use config::Config;
pub use engine::Engine;
pub use network::{Client, Endpoint};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tiny-mp-cache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

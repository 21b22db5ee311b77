//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append log entries before any mutation becomes visible
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery and replay, discarding a torn final entry
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Entry 1                                              │
//! │ ┌─────────┬─────────┬──────────┬──────────┬────────┐ │
//! │ │ LSN (8) │ Len (4) │ HCRC (4) │ CRC (4)  │ Data   │ │
//! │ └─────────┴─────────┴──────────┴──────────┴────────┘ │
//! ├──────────────────────────────────────────────────────┤
//! │ Entry 2                                              │
//! │ ...                                                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Integers are little-endian. `Data` is the bincode encoding of
//! `(operation, timestamp)`. HCRC covers LSN and Len, so a damaged length
//! is detected before it is used; CRC covers LSN, Len and Data.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{WalEntry, Operation, HEADER_SIZE, MAX_ENTRY_DATA_SIZE};
pub use writer::WalWriter;
pub use reader::{WalReader, WalIterator};
pub use recovery::{WalRecovery, RecoveryResult};

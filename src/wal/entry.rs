//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their on-disk
//! framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Frame header: LSN (8) + Len (4) + header CRC (4) + data CRC (4)
pub const HEADER_SIZE: usize = 20;

/// Largest data section a single entry may carry (64 MB)
pub const MAX_ENTRY_DATA_SIZE: usize = 64 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert or overwrite a key
    Set { key: String, value: Vec<u8> },

    /// Remove a key via DEL
    Delete { key: String },

    /// Remove a key via POP (same replay effect as Delete)
    Pop { key: String },
}

impl Operation {
    /// The key this operation touches
    pub fn key(&self) -> &str {
        match self {
            Operation::Set { key, .. } | Operation::Delete { key } | Operation::Pop { key } => {
                key
            }
        }
    }
}

/// Parsed frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub len: u32,
    pub header_crc: u32,
    pub crc: u32,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut lsn = [0u8; 8];
        let mut len = [0u8; 4];
        let mut header_crc = [0u8; 4];
        let mut crc = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        len.copy_from_slice(&bytes[8..12]);
        header_crc.copy_from_slice(&bytes[12..16]);
        crc.copy_from_slice(&bytes[16..20]);

        Self {
            lsn: u64::from_le_bytes(lsn),
            len: u32::from_le_bytes(len),
            header_crc: u32::from_le_bytes(header_crc),
            crc: u32::from_le_bytes(crc),
        }
    }

    /// Whether LSN and Len are intact, so `len` can be trusted
    pub fn is_intact(&self) -> bool {
        compute_header_crc(self.lsn, self.len) == self.header_crc
    }

    /// Total frame size including the header
    pub fn frame_len(&self) -> u64 {
        HEADER_SIZE as u64 + self.len as u64
    }
}

/// CRC32 over LSN and length only
pub(crate) fn compute_header_crc(lsn: u64, len: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&lsn.to_le_bytes());
    hasher.update(&len.to_le_bytes());
    hasher.finalize()
}

/// CRC32 over LSN, length and data
pub(crate) fn compute_crc(lsn: u64, len: u32, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&lsn.to_le_bytes());
    hasher.update(&len.to_le_bytes());
    hasher.update(data);
    hasher.finalize()
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Build a frame for an operation without taking ownership of it
pub(crate) fn encode_frame(lsn: u64, operation: &Operation, timestamp: u64) -> Result<Vec<u8>> {
    let data = bincode::serialize(&(operation, timestamp))
        .map_err(|e| CacheError::Serialization(e.to_string()))?;

    if data.len() > MAX_ENTRY_DATA_SIZE {
        return Err(CacheError::WalWrite(format!(
            "entry too large: {} bytes (max {})",
            data.len(),
            MAX_ENTRY_DATA_SIZE
        )));
    }

    let len = data.len() as u32;
    let crc = compute_crc(lsn, len, &data);

    let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
    frame.extend_from_slice(&lsn.to_le_bytes());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&compute_header_crc(lsn, len).to_le_bytes());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&data);
    Ok(frame)
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        Self {
            lsn,
            operation,
            timestamp: now_millis(),
        }
    }

    /// Serialize into a complete frame (header + data)
    pub fn serialize(&self) -> Result<Vec<u8>> {
        encode_frame(self.lsn, &self.operation, self.timestamp)
    }

    /// Deserialize one complete frame, verifying its checksum
    ///
    /// Bytes beyond the frame are ignored.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CacheError::WalCorruption(format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        header_bytes.copy_from_slice(&bytes[..HEADER_SIZE]);
        let header = FrameHeader::parse(&header_bytes);
        if !header.is_intact() {
            return Err(CacheError::WalCorruption(format!(
                "header checksum mismatch (lsn field {})",
                header.lsn
            )));
        }

        let frame_len = header.frame_len() as usize;
        if bytes.len() < frame_len {
            return Err(CacheError::WalCorruption(format!(
                "incomplete data: expected {} bytes, got {}",
                frame_len,
                bytes.len()
            )));
        }

        let data = &bytes[HEADER_SIZE..frame_len];
        if compute_crc(header.lsn, header.len, data) != header.crc {
            return Err(CacheError::WalCorruption(format!(
                "checksum mismatch for lsn {}",
                header.lsn
            )));
        }

        Self::decode_data(header.lsn, data)
    }

    /// Decode the data section of a frame whose checksum already matched
    pub(crate) fn decode_data(lsn: u64, data: &[u8]) -> Result<Self> {
        let (operation, timestamp): (Operation, u64) =
            bincode::deserialize(data).map_err(|e| {
                CacheError::WalCorruption(format!("undecodable entry at lsn {}: {}", lsn, e))
            })?;

        Ok(Self {
            lsn,
            operation,
            timestamp,
        })
    }
}

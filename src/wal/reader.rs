//! WAL Reader
//!
//! Handles reading entries from the WAL file.
//!
//! A damaged final frame is a torn write from a crash mid-append: the reader
//! stops there and reports it through `has_torn_tail`. A final frame counts
//! as torn when its header is short, its intact header points past the end
//! of the file, its data checksum fails, or the tail is all zeros. A header
//! whose own checksum fails is corruption, as is any damage followed by more
//! data.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{CacheError, Result};
use super::entry::{compute_crc, FrameHeader};
use super::{WalEntry, HEADER_SIZE, MAX_ENTRY_DATA_SIZE};

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset just past the last good entry
    position: u64,

    /// File length at open time
    file_len: u64,

    /// LSN of the last good entry (0 before the first)
    last_lsn: u64,

    torn_tail: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
            last_lsn: 0,
            torn_tail: false,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at the end of the log, including when the final
    /// frame is torn.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        if self.torn_tail {
            return Ok(None);
        }

        let remaining = self.file_len - self.position;
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < HEADER_SIZE as u64 {
            return Ok(self.torn("incomplete header"));
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header_bytes)?;
        let header = FrameHeader::parse(&header_bytes);

        // Len is only trusted once the header checksum matches.
        if !header.is_intact() {
            if header_bytes.iter().all(|b| *b == 0) && self.rest_is_zero()? {
                return Ok(self.torn("unwritten (zero-filled) tail"));
            }
            return Err(CacheError::WalCorruption(format!(
                "header checksum mismatch at offset {}",
                self.position
            )));
        }
        if header.len as usize > MAX_ENTRY_DATA_SIZE {
            return Err(CacheError::WalCorruption(format!(
                "entry at offset {} declares {} bytes (max {})",
                self.position, header.len, MAX_ENTRY_DATA_SIZE
            )));
        }

        let frame_len = header.frame_len();
        if frame_len > remaining {
            return Ok(self.torn("incomplete data"));
        }

        let mut data = vec![0u8; header.len as usize];
        self.reader.read_exact(&mut data)?;

        if compute_crc(header.lsn, header.len, &data) != header.crc {
            if frame_len == remaining {
                return Ok(self.torn("checksum mismatch on final entry"));
            }
            return Err(CacheError::WalCorruption(format!(
                "checksum mismatch at offset {} (lsn {})",
                self.position, header.lsn
            )));
        }

        let entry = WalEntry::decode_data(header.lsn, &data)?;
        if entry.lsn <= self.last_lsn {
            return Err(CacheError::WalCorruption(format!(
                "lsn {} at offset {} does not follow lsn {}",
                entry.lsn, self.position, self.last_lsn
            )));
        }

        self.position += frame_len;
        self.last_lsn = entry.lsn;
        Ok(Some(entry))
    }

    /// Whether every byte after the current header is zero
    fn rest_is_zero(&mut self) -> Result<bool> {
        let mut left = self.file_len - self.position - HEADER_SIZE as u64;
        let mut buf = [0u8; 8192];
        while left > 0 {
            let chunk = left.min(buf.len() as u64) as usize;
            self.reader.read_exact(&mut buf[..chunk])?;
            if buf[..chunk].iter().any(|b| *b != 0) {
                return Ok(false);
            }
            left -= chunk as u64;
        }
        Ok(true)
    }

    fn torn(&mut self, reason: &str) -> Option<WalEntry> {
        tracing::warn!(
            "WAL torn tail at offset {}: {} ({} bytes discarded)",
            self.position,
            reason,
            self.file_len - self.position
        );
        self.torn_tail = true;
        None
    }

    /// Offset just past the last good entry
    pub fn position(&self) -> u64 {
        self.position
    }

    /// LSN of the last good entry read so far
    pub fn last_lsn(&self) -> u64 {
        self.last_lsn
    }

    /// Whether reading stopped at a torn final frame
    pub fn has_torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
///
/// Yields at most one error, then stops.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl WalIterator {
    /// Whether the underlying reader stopped at a torn tail
    pub fn has_torn_tail(&self) -> bool {
        self.reader.has_torn_tail()
    }
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

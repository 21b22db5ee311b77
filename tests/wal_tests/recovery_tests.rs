//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Replay of clean logs
//! - Torn tails are truncated away
//! - Corruption before the tail and LSN regressions are fatal
//! - verify() is read-only

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tiny_mp_cache::config::WalSyncStrategy;
use tiny_mp_cache::wal::{
    Operation, RecoveryResult, WalEntry, WalRecovery, WalWriter, HEADER_SIZE,
};
use tiny_mp_cache::CacheError;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn write_entries(path: &Path, ops: &[Operation]) -> Vec<u64> {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    ops.iter()
        .map(|op| {
            writer.append(op).unwrap();
            writer.len()
        })
        .collect()
}

fn set(key: &str, value: &str) -> Operation {
    Operation::Set {
        key: key.to_string(),
        value: value.as_bytes().to_vec(),
    }
}

fn append_raw(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

// =============================================================================
// Clean Recovery
// =============================================================================

#[test]
fn test_recover_missing_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result, RecoveryResult::default());
    assert!(!wal_path.exists());
}

#[test]
fn test_recover_clean_log() {
    let (_temp, wal_path) = setup_temp_wal();
    let offsets = write_entries(
        &wal_path,
        &[set("a", "1"), set("b", "2"), Operation::Pop { key: "a".to_string() }],
    );

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].operation, Operation::Pop { key: "a".to_string() });
    assert_eq!(result.entries_recovered, 3);
    assert_eq!(result.last_lsn, 3);
    assert_eq!(result.valid_len, offsets[2]);
    assert!(!result.was_truncated);
}

// =============================================================================
// Torn Tail Truncation
// =============================================================================

#[test]
fn test_partial_header_truncated() {
    let (_temp, wal_path) = setup_temp_wal();
    let offsets = write_entries(&wal_path, &[set("a", "1"), set("b", "2")]);
    append_raw(&wal_path, &[0u8; 7]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 2);
    assert!(result.was_truncated);
    assert_eq!(result.valid_len, offsets[1]);
    assert_eq!(file_len(&wal_path), offsets[1]);
}

#[test]
fn test_partial_data_truncated() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, &[set("a", "1")]);
    let good_len = file_len(&wal_path);

    // A complete frame for lsn 2, cut short
    let frame = WalEntry::new(2, set("b", "a value that will be cut")).serialize().unwrap();
    append_raw(&wal_path, &frame[..frame.len() - 4]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);
    assert_eq!(file_len(&wal_path), good_len);
}

#[test]
fn test_checksum_mismatch_on_final_entry_truncated() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, &[set("a", "1")]);
    let good_len = file_len(&wal_path);

    let mut frame = WalEntry::new(2, set("b", "2")).serialize().unwrap();
    if let Some(byte) = frame.last_mut() {
        *byte ^= 0xFF;
    }
    append_raw(&wal_path, &frame);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert!(result.was_truncated);
    assert_eq!(file_len(&wal_path), good_len);
}

#[test]
fn test_recover_after_truncation_is_clean() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, &[set("a", "1")]);
    append_raw(&wal_path, &[9u8; 3]);

    WalRecovery::recover(&wal_path).unwrap();
    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert!(!result.was_truncated);
}

// =============================================================================
// Fatal Corruption
// =============================================================================

#[test]
fn test_corruption_before_tail_is_fatal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, &[set("a", "1"), set("b", "2")]);
    let original = std::fs::read(&wal_path).unwrap();

    let mut bytes = original.clone();
    bytes[20] ^= 0xFF;
    std::fs::write(&wal_path, &bytes).unwrap();

    let result = WalRecovery::recover(&wal_path);
    assert!(matches!(result, Err(CacheError::WalCorruption(_))));

    // Nothing is truncated when recovery refuses the log
    assert_eq!(file_len(&wal_path), original.len() as u64);
}

#[test]
fn test_non_increasing_lsn_is_fatal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, &[set("a", "1"), set("b", "2")]);

    // A well-formed frame that goes back in time
    let frame = WalEntry::new(1, set("c", "3")).serialize().unwrap();
    append_raw(&wal_path, &frame);

    let result = WalRecovery::recover(&wal_path);
    assert!(matches!(result, Err(CacheError::WalCorruption(_))));
}

#[test]
fn test_corrupted_length_in_first_record_is_fatal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(
        &wal_path,
        &[set("a", "1"), set("b", "2"), set("c", "3"), set("d", "4")],
    );

    // Len of record 1 now points far past the end of the file
    let mut bytes = std::fs::read(&wal_path).unwrap();
    let before = bytes.len() as u64;
    bytes[8..12].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());
    std::fs::write(&wal_path, &bytes).unwrap();

    let result = WalRecovery::recover(&wal_path);
    assert!(matches!(result, Err(CacheError::WalCorruption(_))));
    assert_eq!(file_len(&wal_path), before);
}

#[test]
fn test_corrupted_length_in_final_record_is_fatal() {
    let (_temp, wal_path) = setup_temp_wal();
    let offsets = write_entries(&wal_path, &[set("a", "1"), set("b", "2")]);

    let mut bytes = std::fs::read(&wal_path).unwrap();
    let len_at = offsets[0] as usize + 8;
    bytes[len_at] ^= 0x01;
    std::fs::write(&wal_path, &bytes).unwrap();

    assert!(matches!(
        WalRecovery::verify(&wal_path),
        Err(CacheError::WalCorruption(_))
    ));
}

#[test]
fn test_zero_filled_tail_truncated() {
    let (_temp, wal_path) = setup_temp_wal();
    let offsets = write_entries(&wal_path, &[set("a", "1")]);

    // Space allocated for an append whose data never reached the disk
    append_raw(&wal_path, &[0u8; 64]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert!(result.was_truncated);
    assert_eq!(file_len(&wal_path), offsets[0]);
}

#[test]
fn test_zero_header_followed_by_data_is_fatal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, &[set("a", "1")]);

    append_raw(&wal_path, &[0u8; HEADER_SIZE]);
    append_raw(&wal_path, &WalEntry::new(2, set("b", "2")).serialize().unwrap());

    let result = WalRecovery::recover(&wal_path);
    assert!(matches!(result, Err(CacheError::WalCorruption(_))));
}

// =============================================================================
// Verify / Repair
// =============================================================================

#[test]
fn test_verify_does_not_modify() {
    let (_temp, wal_path) = setup_temp_wal();
    let offsets = write_entries(&wal_path, &[set("a", "1"), set("b", "2")]);
    append_raw(&wal_path, &[0xEE; 10]);
    let before = file_len(&wal_path);

    let result = WalRecovery::verify(&wal_path).unwrap();

    assert!(result.was_truncated);
    assert_eq!(result.valid_len, offsets[1]);
    assert_eq!(file_len(&wal_path), before);
}

#[test]
fn test_verify_agrees_with_recover() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, &[set("a", "1"), Operation::Delete { key: "a".to_string() }]);
    append_raw(&wal_path, &[0x01; 4]);

    let verified = WalRecovery::verify(&wal_path).unwrap();
    let (_, recovered) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(verified, recovered);
}

#[test]
fn test_repair_truncates() {
    let (_temp, wal_path) = setup_temp_wal();
    let offsets = write_entries(&wal_path, &[set("a", "1")]);
    append_raw(&wal_path, &[0x42; 12]);

    let result = WalRecovery::repair(&wal_path).unwrap();

    assert_eq!(result.entries_recovered, 1);
    assert!(result.was_truncated);
    assert_eq!(file_len(&wal_path), offsets[0]);
}

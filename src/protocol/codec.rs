//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - GET / DEL / POP: key_len (4 bytes) + key
//! - SET:             key_len (4 bytes) + key + value
//! - KEYS:            pattern_len (4 bytes) + pattern
//! - LEN / PING:      empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Response Type
//! - OK / NIL: empty
//! - ERROR:    UTF-8 message
//! - VALUE:    raw bytes
//! - INTEGER:  i64 (8 bytes)
//! - KEYS:     count (4 bytes) + (key_len (4 bytes) + key) per key
//!
//! All integers are big-endian.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CacheError, Result};
use super::{Command, CommandType, Response, ResponseType};

/// Header size: 1 byte command/tag + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum request payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Maximum response payload size (1 GB)
///
/// Larger than the request limit: a KEYS listing grows with the Store.
pub const MAX_RESPONSE_SIZE: u32 = 1024 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
///
/// Fails if the payload exceeds `MAX_PAYLOAD_SIZE`.
pub fn encode_command(command: &Command) -> Result<Bytes> {
    let mut payload = BytesMut::new();

    match command {
        Command::Get { key } | Command::Delete { key } | Command::Pop { key } => {
            put_string(&mut payload, key);
        }
        Command::Set { key, value } => {
            payload.reserve(4 + key.len() + value.len());
            put_string(&mut payload, key);
            payload.put_slice(value);
        }
        Command::Keys { pattern } => {
            put_string(&mut payload, pattern);
        }
        Command::Len | Command::Ping => {}
    }

    frame(command.command_type() as u8, &payload, MAX_PAYLOAD_SIZE, "command")
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (tag, mut payload) = split_frame(bytes, MAX_PAYLOAD_SIZE, "command")?;

    let cmd_type = CommandType::from_u8(tag).ok_or_else(|| {
        CacheError::Protocol(format!("Unknown command type: 0x{:02x}", tag))
    })?;
    let name = cmd_type.name();

    let command = match cmd_type {
        CommandType::Get => Command::Get {
            key: take_string(&mut payload, name)?,
        },
        CommandType::Delete => Command::Delete {
            key: take_string(&mut payload, name)?,
        },
        CommandType::Pop => Command::Pop {
            key: take_string(&mut payload, name)?,
        },
        CommandType::Set => {
            let key = take_string(&mut payload, name)?;
            let value = payload.to_vec();
            payload.advance(value.len());
            Command::Set { key, value }
        }
        CommandType::Keys => Command::Keys {
            pattern: take_string(&mut payload, name)?,
        },
        CommandType::Len => Command::Len,
        CommandType::Ping => Command::Ping,
    };

    expect_end(payload, name)?;
    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: tag (1) + payload_len (4) + payload
///
/// Fails if the payload exceeds `MAX_RESPONSE_SIZE`.
pub fn encode_response(response: &Response) -> Result<Bytes> {
    let mut payload = BytesMut::new();

    match response {
        Response::Ok | Response::Nil => {}
        Response::Error(message) => payload.put_slice(message.as_bytes()),
        Response::Value(value) => payload.put_slice(value),
        Response::Integer(n) => payload.put_i64(*n),
        Response::Keys(keys) => {
            let count = u32::try_from(keys.len()).map_err(|_| {
                CacheError::Protocol(format!("KEYS response: {} keys is too many", keys.len()))
            })?;
            payload.put_u32(count);
            for key in keys {
                put_string(&mut payload, key);
            }
        }
    }

    frame(response.response_type() as u8, &payload, MAX_RESPONSE_SIZE, "response")
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (tag, mut payload) = split_frame(bytes, MAX_RESPONSE_SIZE, "response")?;

    let response_type = ResponseType::from_u8(tag).ok_or_else(|| {
        CacheError::Protocol(format!("Unknown response status: 0x{:02x}", tag))
    })?;

    let response = match response_type {
        ResponseType::Ok => Response::Ok,
        ResponseType::Nil => Response::Nil,
        ResponseType::Error => {
            let message = String::from_utf8_lossy(payload).into_owned();
            payload.advance(payload.len());
            Response::Error(message)
        }
        ResponseType::Value => {
            let value = payload.to_vec();
            payload.advance(value.len());
            Response::Value(value)
        }
        ResponseType::Integer => {
            if payload.remaining() < 8 {
                return Err(CacheError::Protocol(format!(
                    "INTEGER response: expected 8 bytes, got {}",
                    payload.remaining()
                )));
            }
            Response::Integer(payload.get_i64())
        }
        ResponseType::Keys => {
            let count = take_u32(&mut payload, "KEYS response")? as usize;
            // Every key costs at least its 4-byte length prefix.
            let mut keys = Vec::with_capacity(count.min(payload.remaining() / 4));
            for _ in 0..count {
                keys.push(take_string(&mut payload, "KEYS response")?);
            }
            Response::Keys(keys)
        }
    };

    expect_end(payload, "response")?;
    Ok(response)
}

// =============================================================================
// Framing helpers
// =============================================================================

/// Prefix a payload with its header
///
/// Oversized payloads are refused here, so no frame the peer would reject
/// is ever written and the length never wraps.
fn frame(tag: u8, payload: &[u8], max: u32, what: &str) -> Result<Bytes> {
    let payload_len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= max)
        .ok_or_else(|| {
            CacheError::Protocol(format!(
                "{} payload too large: {} bytes (max {})",
                what,
                payload.len(),
                max
            ))
        })?;

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload_len);
    message.put_slice(payload);
    Ok(message.freeze())
}

/// Validate the header and return (tag, payload)
fn split_frame<'a>(bytes: &'a [u8], max: u32, what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(CacheError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let tag = header.get_u8();
    let payload_len = header.get_u32();
    check_payload_len(payload_len, max, what)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() != total_len {
        return Err(CacheError::Protocol(format!(
            "Malformed {} frame: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(payload_len: u32, max: u32, what: &str) -> Result<()> {
    if payload_len > max {
        return Err(CacheError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, max
        )));
    }
    Ok(())
}

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn take_u32(buf: &mut &[u8], what: &str) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(CacheError::Protocol(format!("{}: missing length", what)));
    }
    Ok(buf.get_u32())
}

fn take_string(buf: &mut &[u8], what: &str) -> Result<String> {
    let len = take_u32(buf, what)? as usize;
    if buf.remaining() < len {
        return Err(CacheError::Protocol(format!(
            "{}: incomplete string (expected {}, got {})",
            what,
            len,
            buf.remaining()
        )));
    }

    let s = std::str::from_utf8(&buf[..len])
        .map_err(|e| CacheError::Protocol(format!("{}: invalid UTF-8: {}", what, e)))?
        .to_string();
    buf.advance(len);
    Ok(s)
}

fn expect_end(buf: &[u8], what: &str) -> Result<()> {
    if buf.has_remaining() {
        return Err(CacheError::Protocol(format!(
            "{}: {} unexpected trailing bytes",
            what,
            buf.remaining()
        )));
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R, max: u32, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    check_payload_len(payload_len, max, what)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len as usize];
    message[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut message[HEADER_SIZE..])?;
    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader, MAX_PAYLOAD_SIZE, "command")?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, MAX_RESPONSE_SIZE, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

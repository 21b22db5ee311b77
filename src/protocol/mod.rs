//! Protocol Module
//!
//! Defines the wire protocol for client-server communication. The same
//! framing runs over TCP and Unix-domain sockets.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: GET   - Payload: key_len (4) + key
//! - 0x02: SET   - Payload: key_len (4) + key + value
//! - 0x03: DEL   - Payload: key_len (4) + key
//! - 0x04: PING  - Payload: empty
//! - 0x05: POP   - Payload: key_len (4) + key
//! - 0x06: KEYS  - Payload: pattern_len (4) + pattern
//! - 0x07: LEN   - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Response Tags
//! - 0x00: OK
//! - 0x01: NIL
//! - 0x02: ERROR
//! - 0x03: VALUE
//! - 0x04: INTEGER
//! - 0x05: KEYS

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, ResponseType};
pub use codec::{
    encode_command, decode_command, encode_response, decode_response,
    read_command, write_command, read_response, write_response,
    HEADER_SIZE, MAX_PAYLOAD_SIZE, MAX_RESPONSE_SIZE,
};

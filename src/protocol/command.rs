//! Command definitions
//!
//! Represents commands from clients.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Set = 0x02,
    Delete = 0x03,
    Ping = 0x04,
    Pop = 0x05,
    Keys = 0x06,
    Len = 0x07,
}

impl CommandType {
    /// Map a wire tag back to a command type
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(CommandType::Get),
            0x02 => Some(CommandType::Set),
            0x03 => Some(CommandType::Delete),
            0x04 => Some(CommandType::Ping),
            0x05 => Some(CommandType::Pop),
            0x06 => Some(CommandType::Keys),
            0x07 => Some(CommandType::Len),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandType::Get => "GET",
            CommandType::Set => "SET",
            CommandType::Delete => "DEL",
            CommandType::Ping => "PING",
            CommandType::Pop => "POP",
            CommandType::Keys => "KEYS",
            CommandType::Len => "LEN",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: String },

    /// Insert or overwrite a key
    Set { key: String, value: Vec<u8> },

    /// Delete a key
    Delete { key: String },

    /// Read and remove a key in one step
    Pop { key: String },

    /// List keys matching a glob pattern
    Keys { pattern: String },

    /// Number of entries
    Len,

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::Delete { .. } => CommandType::Delete,
            Command::Pop { .. } => CommandType::Pop,
            Command::Keys { .. } => CommandType::Keys,
            Command::Len => CommandType::Len,
            Command::Ping => CommandType::Ping,
        }
    }
}

//! Response definitions
//!
//! Represents responses to clients.

/// Response type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseType {
    Ok = 0x00,
    Nil = 0x01,
    Error = 0x02,
    Value = 0x03,
    Integer = 0x04,
    Keys = 0x05,
}

impl ResponseType {
    /// Map a wire tag back to a response type
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(ResponseType::Ok),
            0x01 => Some(ResponseType::Nil),
            0x02 => Some(ResponseType::Error),
            0x03 => Some(ResponseType::Value),
            0x04 => Some(ResponseType::Integer),
            0x05 => Some(ResponseType::Keys),
            _ => None,
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Success with nothing to return (SET)
    Ok,

    /// The key was absent (GET, POP)
    Nil,

    /// The request failed; carries a message
    Error(String),

    /// A value (GET, POP, PING)
    Value(Vec<u8>),

    /// A count (DEL, LEN)
    Integer(i64),

    /// A key listing (KEYS)
    Keys(Vec<String>),
}

impl Response {
    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Response::Error(message.to_string())
    }

    /// VALUE if present, NIL otherwise
    pub fn value_or_nil(value: Option<Vec<u8>>) -> Self {
        value.map(Response::Value).unwrap_or(Response::Nil)
    }

    pub fn response_type(&self) -> ResponseType {
        match self {
            Response::Ok => ResponseType::Ok,
            Response::Nil => ResponseType::Nil,
            Response::Error(_) => ResponseType::Error,
            Response::Value(_) => ResponseType::Value,
            Response::Integer(_) => ResponseType::Integer,
            Response::Keys(_) => ResponseType::Keys,
        }
    }
}

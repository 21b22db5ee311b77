//! Blocking client
//!
//! Speaks the wire protocol over one persistent connection. Used by the CLI
//! and the integration tests; behaves identically over TCP and Unix sockets.

use std::io::{BufReader, BufWriter, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::error::{CacheError, Result};
use crate::protocol::{read_response, write_command, Command, Response};
use super::Endpoint;

type BoxedReader = BufReader<Box<dyn Read + Send>>;
type BoxedWriter = BufWriter<Box<dyn Write + Send>>;

/// A connection to a cache server
pub struct Client {
    endpoint: Endpoint,
    reader: BoxedReader,
    writer: BoxedWriter,
}

impl Client {
    /// Connect to an endpoint
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        let (read_half, write_half): (Box<dyn Read + Send>, Box<dyn Write + Send>) =
            match endpoint {
                Endpoint::Tcp(addr) => {
                    let stream = TcpStream::connect(addr.as_str()).map_err(|e| {
                        CacheError::Network(format!("connect {}: {}", addr, e))
                    })?;
                    stream.set_nodelay(true)?;
                    (Box::new(stream.try_clone()?), Box::new(stream))
                }
                #[cfg(unix)]
                Endpoint::Unix(path) => {
                    let stream = UnixStream::connect(path).map_err(|e| {
                        CacheError::Network(format!("connect {}: {}", path.display(), e))
                    })?;
                    (Box::new(stream.try_clone()?), Box::new(stream))
                }
            };

        Ok(Self {
            endpoint: endpoint.clone(),
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send one command and wait for its response
    ///
    /// ERROR responses are turned into `CacheError::Server`.
    pub fn request(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        match read_response(&mut self.reader)? {
            Response::Error(message) => Err(CacheError::Server(message)),
            response => Ok(response),
        }
    }

    pub fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let command = Command::Set {
            key: key.to_string(),
            value: value.to_vec(),
        };
        match self.request(&command)? {
            Response::Ok => Ok(()),
            other => Err(unexpected("SET", other)),
        }
    }

    pub fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let command = Command::Get {
            key: key.to_string(),
        };
        value_or_nil("GET", self.request(&command)?)
    }

    /// Returns the number of keys removed (0 or 1)
    pub fn delete(&mut self, key: &str) -> Result<i64> {
        let command = Command::Delete {
            key: key.to_string(),
        };
        match self.request(&command)? {
            Response::Integer(n) => Ok(n),
            other => Err(unexpected("DEL", other)),
        }
    }

    pub fn pop(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let command = Command::Pop {
            key: key.to_string(),
        };
        value_or_nil("POP", self.request(&command)?)
    }

    pub fn keys(&mut self, pattern: &str) -> Result<Vec<String>> {
        let command = Command::Keys {
            pattern: pattern.to_string(),
        };
        match self.request(&command)? {
            Response::Keys(keys) => Ok(keys),
            other => Err(unexpected("KEYS", other)),
        }
    }

    pub fn len(&mut self) -> Result<i64> {
        match self.request(&Command::Len)? {
            Response::Integer(n) => Ok(n),
            other => Err(unexpected("LEN", other)),
        }
    }

    pub fn ping(&mut self) -> Result<()> {
        match self.request(&Command::Ping)? {
            Response::Value(v) if v == b"PONG" => Ok(()),
            other => Err(unexpected("PING", other)),
        }
    }
}

fn value_or_nil(cmd: &str, response: Response) -> Result<Option<Vec<u8>>> {
    match response {
        Response::Value(v) => Ok(Some(v)),
        Response::Nil => Ok(None),
        other => Err(unexpected(cmd, other)),
    }
}

fn unexpected(cmd: &str, response: Response) -> CacheError {
    CacheError::Protocol(format!("unexpected response to {}: {:?}", cmd, response))
}

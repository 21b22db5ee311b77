//! Connection Handler
//!
//! Handles individual client connections over any transport.
//!
//! ## Per-connection state machine
//! ```text
//! AwaitingRequest → Decoding → Applying → EncodingResponse → AwaitingRequest
//!        │              │                          │
//!        └──────────────┴────────→ closed ←─────────┘
//! ```
//!
//! The state a connection was in when it closed is logged.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{CacheError, Result};
use crate::protocol::{encode_response, read_command, write_response, Command, Response};
use super::Transport;

/// Where a connection is in its request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    AwaitingRequest,
    Decoding,
    Applying,
    EncodingResponse,
}

/// Handles a single client connection
pub struct Connection<S: Transport> {
    /// Stream reader (buffered for efficiency)
    reader: BufReader<S>,

    /// Stream writer (buffered for efficiency)
    writer: BufWriter<S>,

    /// Reference to the shared cache engine
    engine: Arc<Engine>,

    /// Peer description for logging
    peer_addr: String,

    state: ConnectionState,
}

impl<S: Transport> Connection<S> {
    /// Create a new connection handler
    ///
    /// Applies transport tuning and sets up buffered I/O
    pub fn new(stream: S, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = stream.peer_label();
        stream.tune()?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
            state: ConnectionState::AwaitingRequest,
        })
    }

    /// Configure connection timeouts (0 = none)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let to_duration = |ms: u64| (ms > 0).then(|| Duration::from_millis(ms));
        self.reader
            .get_ref()
            .set_timeouts(to_duration(read_ms), to_duration(write_ms))?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let result = self.serve();
        tracing::debug!(
            "Connection from {} closed while {:?}",
            self.peer_addr,
            self.state
        );
        result
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            self.state = ConnectionState::AwaitingRequest;
            if !self.wait_for_request()? {
                return Ok(());
            }

            self.state = ConnectionState::Decoding;
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Client {} disconnected mid-request", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_timeout() => {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Best effort: tell the client why it is being dropped
                    if matches!(e, CacheError::Protocol(_)) {
                        let _ = self.send_response(Response::error(&e.to_string()));
                    }
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            self.state = ConnectionState::Applying;
            let response = self.execute_command(command);

            self.state = ConnectionState::EncodingResponse;
            if let Err(e) = self.send_response(response) {
                // The client went away before reading its response.
                if e.is_disconnect() {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Block until the next request starts arriving
    ///
    /// Returns false if the client closed the connection between requests.
    fn wait_for_request(&mut self) -> Result<bool> {
        match self.reader.fill_buf() {
            Ok([]) => {
                tracing::debug!("Client {} disconnected", self.peer_addr);
                Ok(false)
            }
            Ok(_) => Ok(true),
            Err(e) => {
                let e = CacheError::from(e);
                if e.is_disconnect() || e.is_timeout() {
                    tracing::debug!("Client {} gone while idle: {}", self.peer_addr, e);
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&self, command: Command) -> Response {
        let cmd_type = command.command_type();
        match self.engine.execute(command) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "{} from {} failed: {}",
                    cmd_type.name(),
                    self.peer_addr,
                    e
                );
                Response::error(&e.to_string())
            }
        }
    }

    /// Send a response to the client
    ///
    /// A response too large to frame is replaced by an ERROR response.
    fn send_response(&mut self, response: Response) -> Result<()> {
        match encode_response(&response) {
            Ok(bytes) => {
                self.writer.write_all(&bytes)?;
                self.writer.flush()?;
                Ok(())
            }
            Err(CacheError::Protocol(message)) => {
                tracing::warn!("Response to {} not sent: {}", self.peer_addr, message);
                write_response(&mut self.writer, &Response::error(&message))
            }
            Err(e) => Err(e),
        }
    }
}

//! Socket Server
//!
//! Accepts connections on one endpoint and dispatches each to its own
//! worker thread.

use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{CacheError, Result};
use super::transport::{Accepted, Listener};
use super::{Connection, Endpoint, Transport};

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Server for one TCP or Unix-socket endpoint
pub struct Server {
    listener: Listener,

    /// Address actually bound
    endpoint: Endpoint,

    engine: Arc<Engine>,

    max_connections: usize,
    read_timeout_ms: u64,
    write_timeout_ms: u64,

    /// Live connection count
    active: Arc<AtomicUsize>,
    next_conn_id: AtomicU64,

    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
}

/// Stops a running server's accept loop
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Sender<()>,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting
    pub fn shutdown(&self) {
        // A full channel already carries a pending shutdown.
        let _ = self.tx.try_send(());
    }
}

/// A server running on its own accept thread
pub struct ServerHandle {
    endpoint: Endpoint,
    shutdown: ShutdownHandle,
    thread: JoinHandle<Result<()>>,
}

impl ServerHandle {
    /// Address the server is listening on
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Wait for the accept loop to exit on its own
    pub fn join(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|_| CacheError::Network(format!("accept thread for {} panicked", self.endpoint)))?
    }

    /// Stop accepting and wait for the accept thread to exit
    ///
    /// Established connections keep running until their clients hang up.
    pub fn shutdown_and_join(self) -> Result<()> {
        self.shutdown.shutdown();
        self.join()
    }
}

impl Server {
    /// Bind an endpoint
    ///
    /// The socket is listening when this returns, so clients may connect
    /// before `run` is called.
    pub fn bind(endpoint: &Endpoint, config: &Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = Listener::bind(endpoint)?;
        let endpoint = listener.local_endpoint()?;
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);

        tracing::info!("Listening on {}", endpoint);

        Ok(Self {
            listener,
            endpoint,
            engine,
            max_connections: config.max_connections,
            read_timeout_ms: config.read_timeout_ms,
            write_timeout_ms: config.write_timeout_ms,
            active: Arc::new(AtomicUsize::new(0)),
            next_conn_id: AtomicU64::new(1),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Address the server is listening on
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Run the accept loop on a dedicated thread
    pub fn spawn(self) -> Result<ServerHandle> {
        let endpoint = self.endpoint.clone();
        let shutdown = self.shutdown_handle();

        let thread = thread::Builder::new()
            .name(format!("accept {}", endpoint))
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            endpoint,
            shutdown,
            thread,
        })
    }

    /// Start the server (blocking until shutdown)
    ///
    /// The listener is polled in non-blocking mode so a shutdown signal is
    /// noticed within one poll interval.
    pub fn run(self) -> Result<()> {
        self.listener.set_nonblocking(true)?;

        loop {
            match self.shutdown_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            match self.listener.accept() {
                Ok(Accepted::Tcp(stream)) => self.dispatch(stream),
                #[cfg(unix)]
                Ok(Accepted::Unix(stream)) => self.dispatch(stream),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    match self.shutdown_rx.recv_timeout(ACCEPT_POLL_INTERVAL) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    // EMFILE, ECONNABORTED and friends: back off and keep serving
                    tracing::warn!("Accept failed on {}: {}", self.endpoint, e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Stopped listening on {}", self.endpoint);
        Ok(())
    }

    /// Hand an accepted stream to a new worker thread
    fn dispatch<S: Transport>(&self, stream: S) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        if self.active.load(Ordering::Relaxed) >= self.max_connections {
            tracing::warn!(
                "Refusing connection {} from {}: {} connections already active",
                conn_id,
                stream.peer_label(),
                self.max_connections
            );
            return;
        }

        let guard = ActiveGuard::new(Arc::clone(&self.active));
        let engine = Arc::clone(&self.engine);
        let (read_ms, write_ms) = (self.read_timeout_ms, self.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", conn_id))
            .spawn(move || {
                let _guard = guard;
                let result = Connection::new(stream, engine).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection {} closed with error: {}", conn_id, e);
                }
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn worker for connection {}: {}", conn_id, e);
        }
    }
}

/// Decrements the live connection count when a worker exits
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Self(active)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

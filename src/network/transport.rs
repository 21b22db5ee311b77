//! Transport bindings
//!
//! TCP and Unix-domain sockets behind one stream trait, so the connection
//! handler is written once and serves both.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};
use super::Endpoint;

/// A connected byte stream the protocol can run over
pub trait Transport: Read + Write + Send + Sized + 'static {
    /// A second handle to the same socket (one for reading, one for writing)
    fn try_clone(&self) -> io::Result<Self>;

    /// Human-readable peer description for logs
    fn peer_label(&self) -> String;

    /// Apply read/write timeouts (`None` = block forever)
    fn set_timeouts(&self, read: Option<Duration>, write: Option<Duration>) -> io::Result<()>;

    /// Per-transport tuning applied to every accepted stream
    fn tune(&self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn try_clone(&self) -> io::Result<Self> {
        TcpStream::try_clone(self)
    }

    fn peer_label(&self) -> String {
        self.peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    fn set_timeouts(&self, read: Option<Duration>, write: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(read)?;
        self.set_write_timeout(write)
    }

    fn tune(&self) -> io::Result<()> {
        // Some platforms hand out accepted sockets in the listener's mode.
        self.set_nonblocking(false)?;
        // Disable Nagle's algorithm for low latency
        self.set_nodelay(true)
    }
}

#[cfg(unix)]
impl Transport for UnixStream {
    fn try_clone(&self) -> io::Result<Self> {
        UnixStream::try_clone(self)
    }

    fn peer_label(&self) -> String {
        // Client sockets are usually unnamed.
        match self.peer_addr() {
            Ok(addr) => match addr.as_pathname() {
                Some(path) => format!("unix:{}", path.display()),
                None => "unix:(unnamed)".to_string(),
            },
            Err(_) => "unix:unknown".to_string(),
        }
    }

    fn set_timeouts(&self, read: Option<Duration>, write: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(read)?;
        self.set_write_timeout(write)
    }

    fn tune(&self) -> io::Result<()> {
        self.set_nonblocking(false)
    }
}

/// A bound listening socket
pub(crate) enum Listener {
    Tcp(TcpListener),

    #[cfg(unix)]
    Unix { listener: UnixListener, path: PathBuf },
}

/// A freshly accepted stream
pub(crate) enum Accepted {
    Tcp(TcpStream),

    #[cfg(unix)]
    Unix(UnixStream),
}

impl Listener {
    /// Bind the endpoint; the socket is listening when this returns
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr.as_str()).map_err(|e| {
                    CacheError::Network(format!("bind {}: {}", addr, e))
                })?;
                Ok(Listener::Tcp(listener))
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                remove_stale_socket(path)?;
                let listener = UnixListener::bind(path).map_err(|e| {
                    CacheError::Network(format!("bind {}: {}", path.display(), e))
                })?;
                Ok(Listener::Unix {
                    listener,
                    path: path.clone(),
                })
            }
        }
    }

    /// The address actually bound (resolves TCP port 0)
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match self {
            Listener::Tcp(listener) => Ok(Endpoint::Tcp(listener.local_addr()?.to_string())),
            #[cfg(unix)]
            Listener::Unix { path, .. } => Ok(Endpoint::Unix(path.clone())),
        }
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        match self {
            Listener::Tcp(listener) => listener.set_nonblocking(nonblocking),
            #[cfg(unix)]
            Listener::Unix { listener, .. } => listener.set_nonblocking(nonblocking),
        }
    }

    pub fn accept(&self) -> io::Result<Accepted> {
        match self {
            Listener::Tcp(listener) => listener.accept().map(|(s, _)| Accepted::Tcp(s)),
            #[cfg(unix)]
            Listener::Unix { listener, .. } => {
                listener.accept().map(|(s, _)| Accepted::Unix(s))
            }
        }
    }
}

#[cfg(unix)]
impl Drop for Listener {
    fn drop(&mut self) {
        if let Listener::Unix { path, .. } = self {
            match fs::remove_file(&*path) {
                Ok(()) => tracing::debug!("Removed socket file {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove socket {}: {}", path.display(), e),
            }
        }
    }
}

/// Remove a socket file left behind by a previous run
///
/// Anything other than a socket at the path is left alone and reported.
#[cfg(unix)]
fn remove_stale_socket(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            fs::remove_file(path)?;
            tracing::info!("Removed stale socket file {}", path.display());
            Ok(())
        }
        Ok(_) => Err(CacheError::Config(format!(
            "{} exists and is not a socket",
            path.display()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
